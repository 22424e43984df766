use crate::domain::model::{RenderOutcome, UnmatchedSeat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 模板中座位佔位符的格式：`<name>192.168.19.N</name>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenFormat {
    pub open_tag: String,
    pub close_tag: String,
    pub address_prefix: String,
}

impl Default for TokenFormat {
    fn default() -> Self {
        Self {
            open_tag: "<name>".to_string(),
            close_tag: "</name>".to_string(),
            address_prefix: "192.168.19.".to_string(),
        }
    }
}

impl TokenFormat {
    /// 個位數座位不補零，10-99 兩位數
    pub fn address(seat_number: u8) -> String {
        if seat_number < 10 {
            seat_number.to_string()
        } else {
            format!("{:02}", seat_number)
        }
    }

    pub fn placeholder(&self, seat_number: u8) -> String {
        format!(
            "{}{}{}{}",
            self.open_tag,
            self.address_prefix,
            Self::address(seat_number),
            self.close_tag
        )
    }

    pub fn replacement(&self, seat_number: u8, display_name: &str) -> String {
        format!(
            "{}{:02}{}{}",
            self.open_tag, seat_number, display_name, self.close_tag
        )
    }

    /// Tolerates whitespace around the address and extra leading zeros.
    fn near_miss_pattern(&self, seat_number: u8) -> Option<Regex> {
        let pattern = format!(
            r"(?i){}\s*{}\s*0*{}\s*{}",
            regex::escape(&self.open_tag),
            regex::escape(self.address_prefix.trim_end()),
            seat_number,
            regex::escape(&self.close_tag)
        );
        Regex::new(&pattern).ok()
    }
}

/// 將每個座位的佔位符替換為「兩位座位號 + 姓名」。
///
/// Seats are processed in ascending order and each placeholder is replaced
/// at most once. Seats whose placeholder is absent are reported in
/// `unmatched`, together with any near-miss text found in the template.
pub fn render(
    template_text: &str,
    seat_to_name: &BTreeMap<u8, String>,
    format: &TokenFormat,
) -> RenderOutcome {
    let mut text = template_text.to_string();
    let mut matched = BTreeSet::new();
    let mut unmatched = Vec::new();

    for (&seat_number, display_name) in seat_to_name {
        let token = format.placeholder(seat_number);

        if text.contains(&token) {
            text = text.replacen(&token, &format.replacement(seat_number, display_name), 1);
            matched.insert(seat_number);
            continue;
        }

        let near_miss = format
            .near_miss_pattern(seat_number)
            .and_then(|re| re.find(&text).map(|m| m.as_str().to_string()));

        unmatched.push(UnmatchedSeat {
            seat_number,
            expected_token: token,
            near_miss,
        });
    }

    RenderOutcome {
        text,
        matched,
        unmatched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(entries: &[(u8, &str)]) -> BTreeMap<u8, String> {
        entries
            .iter()
            .map(|(seat, name)| (*seat, name.to_string()))
            .collect()
    }

    #[test]
    fn test_address_padding() {
        assert_eq!(TokenFormat::address(5), "5");
        assert_eq!(TokenFormat::address(0), "0");
        assert_eq!(TokenFormat::address(10), "10");
        assert_eq!(TokenFormat::address(48), "48");
    }

    #[test]
    fn test_render_single_digit_seat() {
        let template = "<seat><name>192.168.19.5</name></seat>";
        let outcome = render(template, &seats(&[(5, "Li Wei")]), &TokenFormat::default());

        assert_eq!(outcome.text, "<seat><name>05Li Wei</name></seat>");
        assert!(outcome.matched.contains(&5));
        assert!(outcome.unmatched.is_empty());
    }

    #[test]
    fn test_render_two_digit_seat_does_not_touch_prefix_sibling() {
        let template = "<name>192.168.19.1</name>\n<name>192.168.19.12</name>\n";
        let outcome = render(template, &seats(&[(12, "王芳")]), &TokenFormat::default());

        assert_eq!(
            outcome.text,
            "<name>192.168.19.1</name>\n<name>12王芳</name>\n"
        );
    }

    #[test]
    fn test_render_unmatched_leaves_template_unchanged() {
        let template = "<name>192.168.19.1</name>";
        let outcome = render(template, &seats(&[(7, "赵六")]), &TokenFormat::default());

        assert_eq!(outcome.text, template);
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.unmatched.len(), 1);
        assert_eq!(outcome.unmatched[0].seat_number, 7);
        assert_eq!(outcome.unmatched[0].expected_token, "<name>192.168.19.7</name>");
        assert_eq!(outcome.unmatched[0].near_miss, None);
    }

    #[test]
    fn test_render_continues_after_unmatched_seat() {
        let template = "<name>192.168.19.1</name><name>192.168.19.3</name>";
        let outcome = render(
            template,
            &seats(&[(1, "甲"), (2, "乙"), (3, "丙")]),
            &TokenFormat::default(),
        );

        assert_eq!(outcome.text, "<name>01甲</name><name>03丙</name>");
        assert_eq!(outcome.matched.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(outcome.unmatched.len(), 1);
        assert_eq!(outcome.unmatched[0].seat_number, 2);
    }

    #[test]
    fn test_render_replaces_only_first_occurrence() {
        let template = "<name>192.168.19.4</name>|<name>192.168.19.4</name>";
        let outcome = render(template, &seats(&[(4, "钱七")]), &TokenFormat::default());

        assert_eq!(outcome.text, "<name>04钱七</name>|<name>192.168.19.4</name>");
    }

    #[test]
    fn test_render_reports_near_miss() {
        let template = "<name>192.168.19. 05 </name>";
        let outcome = render(template, &seats(&[(5, "孙八")]), &TokenFormat::default());

        assert_eq!(outcome.text, template);
        assert_eq!(
            outcome.unmatched[0].near_miss.as_deref(),
            Some("<name>192.168.19. 05 </name>")
        );
    }

    #[test]
    fn test_render_custom_token_format() {
        let format = TokenFormat {
            open_tag: "[[".to_string(),
            close_tag: "]]".to_string(),
            address_prefix: "seat-".to_string(),
        };
        let outcome = render("A [[seat-9]] B", &seats(&[(9, "周九")]), &format);
        assert_eq!(outcome.text, "A [[09周九]] B");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = "<name>192.168.19.2</name><name>192.168.19.1</name>";
        let input = seats(&[(2, "b"), (1, "a")]);
        let first = render(template, &input, &TokenFormat::default());
        let second = render(template, &input, &TokenFormat::default());
        assert_eq!(first, second);
    }
}
