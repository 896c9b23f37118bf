use anyhow::bail;
use iiif_bench_runner::prelude::Step;

/// The scaling table, grouped by canvases-per-manifest. Each group holds a
/// tenfold-ascending run of manifest counts; groups themselves ascend in
/// canvas count, so taking the first N groups keeps the run ordered by scale.
fn groups() -> Vec<Vec<Step>> {
    let group = |canvases: u64, manifests: &[u64]| {
        manifests
            .iter()
            .map(|&m| Step {
                manifests: m,
                canvases,
            })
            .collect::<Vec<_>>()
    };

    vec![
        group(10, &[10, 100, 1000]),
        group(100, &[100, 1000, 10000]),
        group(1000, &[100, 1000, 10000]),
        group(10000, &[100, 1000, 10000]),
        group(100000, &[100, 1000, 10000]),
        group(1000000, &[100, 1000, 10000]),
    ]
}

/// The first `group_count` groups, flattened into the ordered step list.
pub fn flattened(group_count: usize) -> anyhow::Result<Vec<Step>> {
    let groups = groups();
    if group_count == 0 || group_count > groups.len() {
        bail!(
            "number of step groups must be between 1 and {}, got {}",
            groups.len(),
            group_count
        );
    }
    Ok(groups.into_iter().take(group_count).flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn two_groups_give_six_steps() {
        let steps = flattened(2).unwrap();
        assert_eq!(steps.len(), 6);
        assert_eq!(
            steps[0],
            Step {
                manifests: 10,
                canvases: 10
            }
        );
        assert_eq!(
            steps[5],
            Step {
                manifests: 10000,
                canvases: 100
            }
        );
    }

    #[test]
    fn group_count_is_bounded() {
        assert!(flattened(0).is_err());
        assert!(flattened(7).is_err());
        assert_eq!(flattened(6).unwrap().len(), 18);
    }
}
