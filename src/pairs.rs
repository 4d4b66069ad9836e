use crate::ranking::Item;

/// Number of submission-pair comparisons a full run performs, i.e. the sum of
/// `n_i * n_j` over all item pairs `i < j`.
///
/// Only sizes the progress display. The cutoff decides where results land,
/// not which pairs get compared, so it does not affect the total.
pub fn count_pairs(items: &[Item], _cutoff: usize) -> u64 {
    let (total, squares) = items.iter().fold((0u64, 0u64), |(t, sq), item| {
        let n = item.len() as u64;
        (t + n, sq + n * n)
    });
    (total * total - squares) / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn item(rank: usize, n: usize) -> Item {
        let subs = (0..n).map(|s| PathBuf::from(format!("u{}/{}", rank, s))).collect();
        Item::new(format!("u{}", rank), rank, 0, subs)
    }

    fn brute_force(items: &[Item]) -> u64 {
        let mut total = 0;
        for i in 0..items.len() {
            for j in i + 1..items.len() {
                total += (items[i].len() * items[j].len()) as u64;
            }
        }
        total
    }

    #[test]
    fn test_empty_ranking_is_zero() {
        assert_eq!(count_pairs(&[], 0), 0);
    }

    #[test]
    fn test_single_item_is_zero() {
        assert_eq!(count_pairs(&[item(0, 7)], 1), 0);
    }

    #[test]
    fn test_scenario_total() {
        let items = vec![item(0, 2), item(1, 1), item(2, 2)];
        // u1-u2 2*1, u1-u3 2*2, u2-u3 1*2
        assert_eq!(count_pairs(&items, 1), 8);
        assert_eq!(count_pairs(&items, 1), brute_force(&items));
    }

    #[test]
    fn test_matches_brute_force_with_empty_items() {
        let sizes = [3, 0, 5, 1, 0, 4, 2];
        let items: Vec<Item> = sizes.iter().enumerate().map(|(r, &n)| item(r, n)).collect();
        for cutoff in 0..=items.len() {
            assert_eq!(count_pairs(&items, cutoff), brute_force(&items));
        }
    }
}
