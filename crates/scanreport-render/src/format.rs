//! Human-readable sizes and counts.

use humansize::DECIMAL;

/// Format bytes in decimal units ("1.50 MB").
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, DECIMAL)
}

const COUNT_WORDS: [(u64, &str); 5] = [
    (1_000_000, "million"),
    (1_000_000_000, "billion"),
    (1_000_000_000_000, "trillion"),
    (1_000_000_000_000_000, "quadrillion"),
    (1_000_000_000_000_000_000, "quintillion"),
];

/// Format an entry count as words above one million ("1.2 million").
///
/// Below one million the plain integer is returned.
pub fn format_count(count: u64) -> String {
    let Some(idx) = COUNT_WORDS.iter().rposition(|(power, _)| count >= *power) else {
        return count.to_string();
    };

    let scaled = |i: usize| (count as f64 / COUNT_WORDS[i].0 as f64 * 10.0).round() / 10.0;

    // 999_950_000 rounds to "1000.0 million"; promote it to the next word.
    let mut idx = idx;
    if scaled(idx) >= 1000.0 && idx + 1 < COUNT_WORDS.len() {
        idx += 1;
    }
    format!("{:.1} {}", scaled(idx), COUNT_WORDS[idx].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert!(format_size(0).starts_with('0'));
        assert!(format_size(1_000).ends_with("kB"));
        assert!(format_size(1_500_000).starts_with("1.5"));
        assert!(format_size(1_500_000).ends_with("MB"));
    }

    #[test]
    fn test_format_count_small() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999_999), "999999");
    }

    #[test]
    fn test_format_count_words() {
        assert_eq!(format_count(1_000_000), "1.0 million");
        assert_eq!(format_count(1_240_000), "1.2 million");
        assert_eq!(format_count(3_400_000_000), "3.4 billion");
        assert_eq!(format_count(999_960_000), "1.0 billion");
        assert_eq!(format_count(u64::MAX), "18.4 quintillion");
    }
}
