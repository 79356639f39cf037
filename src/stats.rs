use crate::matcher::{Draw, MAX_NUMBER};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberFrequency {
    pub number: u8,
    pub count: u32,
}

/// How often each of 1..=45 appeared among main numbers, most frequent first.
/// Ties are broken by the smaller number.
pub fn number_frequency<'a, I>(draws: I) -> Vec<NumberFrequency>
where
    I: IntoIterator<Item = &'a Draw>,
{
    let mut counts = [0u32; MAX_NUMBER as usize + 1];
    for draw in draws {
        for &n in draw.main_numbers() {
            counts[n as usize] += 1;
        }
    }

    let mut frequencies: Vec<NumberFrequency> = (1..=MAX_NUMBER as u8)
        .map(|number| NumberFrequency {
            number,
            count: counts[number as usize],
        })
        .collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draw(no: u32, main: [i64; 6], bonus: i64) -> Draw {
        Draw::new(no, NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(), main, bonus).unwrap()
    }

    #[test]
    fn test_frequency_order() {
        let draws = vec![
            draw(1, [1, 2, 3, 4, 5, 6], 7),
            draw(2, [3, 4, 5, 6, 7, 8], 9),
            draw(3, [5, 6, 10, 11, 12, 13], 14),
        ];
        let freq = number_frequency(&draws);

        assert_eq!(freq.len(), 45);
        assert_eq!(freq[0], NumberFrequency { number: 5, count: 3 });
        assert_eq!(freq[1], NumberFrequency { number: 6, count: 3 });
        assert_eq!(freq[2], NumberFrequency { number: 3, count: 2 });
        assert_eq!(freq.last().unwrap(), &NumberFrequency { number: 45, count: 0 });
    }

    #[test]
    fn test_bonus_not_counted() {
        let draws = vec![draw(1, [1, 2, 3, 4, 5, 6], 7)];
        let freq = number_frequency(&draws);
        let seven = freq.iter().find(|f| f.number == 7).unwrap();
        assert_eq!(seven.count, 0);
    }
}
