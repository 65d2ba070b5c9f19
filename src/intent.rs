//! Extract a structured market view from free-text requests.
//! Handles Chinese and English phrasing ("我强烈看涨特斯拉", "AAPL短期可能会下跌").

use regex::Regex;

use crate::types::{Direction, ExplicitFields, ParsedIntent, RiskProfile, Strength, Timeframe};

/// Company names (matched against lowercased text) resolved before any
/// symbol-shaped token.
const NAME_TO_TICKER: &[(&str, &str)] = &[
    ("特斯拉", "TSLA"),
    ("苹果", "AAPL"),
    ("英伟达", "NVDA"),
    ("微软", "MSFT"),
    ("谷歌", "GOOGL"),
    ("亚马逊", "AMZN"),
    ("脸书", "META"),
    ("meta", "META"),
    ("奈飞", "NFLX"),
    ("阿里巴巴", "BABA"),
    ("腾讯", "TCEHY"),
    ("比亚迪", "BYDDY"),
    ("拼多多", "PDD"),
    ("京东", "JD"),
    ("百度", "BIDU"),
    ("小鹏", "XPEV"),
    ("蔚来", "NIO"),
    ("理想", "LI"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("microsoft", "MSFT"),
    ("alphabet", "GOOGL"),
    ("google", "GOOGL"),
    ("amazon", "AMZN"),
    ("netflix", "NFLX"),
    ("alibaba", "BABA"),
];

/// Lowercase tokens accepted as tickers when nobody typed them in capitals.
const LOWERCASE_WHITELIST: &[&str] = &[
    "tsla", "aapl", "nvda", "msft", "googl", "amzn", "meta", "nflx",
];

const DIRECTION_KEYWORDS: &[(Direction, &[&str])] = &[
    (
        Direction::Bullish,
        &[
            "看涨", "看多", "上涨", "涨", "突破", "新高", "买入", "long", "call", "做多", "上升",
            "牛市", "bullish",
        ],
    ),
    (
        Direction::Bearish,
        &[
            "看跌", "看空", "下跌", "跌", "回调", "做空", "short", "put", "下降", "熊市", "跌破",
            "bearish",
        ],
    ),
    (
        Direction::Neutral,
        &[
            "震荡", "横盘", "区间", "盘整", "不确定", "中性", "neutral", "波动", "震荡市",
            "sideways",
        ],
    ),
];

const STRENGTH_KEYWORDS: &[(Strength, &[&str])] = &[
    (
        Strength::Strong,
        &[
            "强烈", "非常", "极度", "大幅", "暴涨", "暴跌", "必定", "肯定", "确信", "很", "十分",
            "strongly",
        ],
    ),
    (
        Strength::Moderate,
        &[
            "可能", "应该", "预计", "温和", "适度", "一般", "或许", "大概", "估计", "probably",
        ],
    ),
    (
        Strength::Slight,
        &["略微", "小幅", "稍微", "轻微", "也许", "微微", "稍稍", "slightly"],
    ),
];

const TIMEFRAME_KEYWORDS: &[(Timeframe, &[&str])] = &[
    (
        Timeframe::Short,
        &[
            "短期", "近期", "本周", "本月", "1个月", "快速", "短线", "一周", "几天",
        ],
    ),
    (
        Timeframe::Medium,
        &["中期", "季度", "2-3个月", "几个月", "中线", "两个月", "三个月"],
    ),
    (
        Timeframe::Long,
        &["长期", "年度", "长线", "半年", "一年", "长远", "长久"],
    ),
];

const RISK_KEYWORDS: &[(RiskProfile, &[&str])] = &[
    (
        RiskProfile::Aggressive,
        &["激进", "赌", "all in", "梭哈", "重仓", "高风险", "冒险", "大胆", "aggressive"],
    ),
    (
        RiskProfile::Balanced,
        &["平衡", "稳健", "适中", "中等", "均衡", "balanced"],
    ),
    (
        RiskProfile::Conservative,
        &["保守", "稳妥", "安全", "低风险", "谨慎", "稳定", "conservative"],
    ),
];

// Confidence weights in percentage points; summed as integers so 0.75 stays exact.
const TICKER_POINTS: u32 = 30;
const DIRECTION_POINTS: u32 = 30;
const STRENGTH_POINTS: u32 = 15;
const TIMEFRAME_POINTS: u32 = 15;
const RISK_POINTS: u32 = 10;

pub struct IntentExtractor {
    ascii_token: Regex,
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentExtractor {
    pub fn new() -> Self {
        Self {
            ascii_token: Regex::new(r"[A-Za-z0-9]+").expect("ascii token pattern is valid"),
        }
    }

    /// Best-effort parse; unmatched fields stay empty or take their defaults.
    pub fn parse(&self, text: &str) -> ParsedIntent {
        let lower = text.to_lowercase();

        let ticker = self.extract_ticker(text, &lower);
        let direction = best_category(&lower, DIRECTION_KEYWORDS);
        let strength = best_category(&lower, STRENGTH_KEYWORDS);
        let timeframe = best_category(&lower, TIMEFRAME_KEYWORDS);
        let risk_profile = best_category(&lower, RISK_KEYWORDS);

        let mut points = 0;
        if ticker.is_some() {
            points += TICKER_POINTS;
        }
        if direction.is_some() {
            points += DIRECTION_POINTS;
        }
        if strength.is_some() {
            points += STRENGTH_POINTS;
        }
        if timeframe.is_some() {
            points += TIMEFRAME_POINTS;
        }
        if risk_profile.is_some() {
            points += RISK_POINTS;
        }

        ParsedIntent {
            ticker,
            direction,
            strength: strength.unwrap_or(Strength::Moderate),
            timeframe: timeframe.unwrap_or(Timeframe::Short),
            risk_profile: risk_profile.unwrap_or(RiskProfile::Balanced),
            confidence: f64::from(points.min(100)) / 100.0,
            raw_text: text.to_string(),
            explicit: ExplicitFields {
                strength: strength.is_some(),
                timeframe: timeframe.is_some(),
                risk_profile: risk_profile.is_some(),
            },
        }
    }

    fn extract_ticker(&self, text: &str, lower: &str) -> Option<String> {
        if let Some((_, sym)) = NAME_TO_TICKER.iter().find(|(name, _)| lower.contains(name)) {
            return Some((*sym).to_string());
        }

        // ASCII runs are delimited by anything else, CJK characters included.
        let upper = self.ascii_token.find_iter(text).map(|m| m.as_str()).find(|tok| {
            (2..=5).contains(&tok.len()) && tok.chars().all(|c| c.is_ascii_uppercase())
        });
        if let Some(tok) = upper {
            return Some(tok.to_string());
        }

        self.ascii_token
            .find_iter(lower)
            .map(|m| m.as_str())
            .find(|tok| LOWERCASE_WHITELIST.contains(tok))
            .map(|tok| tok.to_ascii_uppercase())
    }
}

/// Category with the most distinct keyword hits; ties go to the earlier entry.
fn best_category<T: Copy>(text: &str, table: &[(T, &[&str])]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (category, keywords) in table {
        let hits = keywords.iter().filter(|k| text.contains(*k)).count();
        if hits == 0 {
            continue;
        }
        match best {
            Some((_, n)) if n >= hits => {}
            _ => best = Some((*category, hits)),
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> ParsedIntent {
        IntentExtractor::new().parse(s)
    }

    #[test]
    fn strong_bullish_tesla_in_chinese() {
        let i = parse("我强烈看涨特斯拉股票，用什么策略？");
        assert_eq!(i.ticker.as_deref(), Some("TSLA"));
        assert_eq!(i.direction, Some(Direction::Bullish));
        assert_eq!(i.strength, Strength::Strong);
        assert!(i.confidence >= 0.75, "confidence {}", i.confidence);
        assert!(i.explicit.strength);
        assert!(!i.explicit.timeframe);
    }

    #[test]
    fn uppercase_symbol_with_short_bearish_view() {
        let i = parse("AAPL短期可能会下跌");
        assert_eq!(i.ticker.as_deref(), Some("AAPL"));
        assert_eq!(i.direction, Some(Direction::Bearish));
        assert_eq!(i.strength, Strength::Moderate);
        assert_eq!(i.timeframe, Timeframe::Short);
        assert!(i.explicit.timeframe);
    }

    #[test]
    fn long_term_conservative_nvidia() {
        let i = parse("英伟达长期看多，但要保守一点");
        assert_eq!(i.ticker.as_deref(), Some("NVDA"));
        assert_eq!(i.direction, Some(Direction::Bullish));
        assert_eq!(i.timeframe, Timeframe::Long);
        assert_eq!(i.risk_profile, RiskProfile::Conservative);
        assert!((i.confidence - 0.85).abs() < 1e-12);
    }

    #[test]
    fn neutral_and_aggressive() {
        let i = parse("MSFT震荡，想激进一点");
        assert_eq!(i.ticker.as_deref(), Some("MSFT"));
        assert_eq!(i.direction, Some(Direction::Neutral));
        assert_eq!(i.risk_profile, RiskProfile::Aggressive);
    }

    #[test]
    fn symbol_glued_to_cjk_text() {
        let i = parse("看跌TSLA，短期内会跌");
        assert_eq!(i.ticker.as_deref(), Some("TSLA"));
        assert_eq!(i.direction, Some(Direction::Bearish));
    }

    #[test]
    fn lowercase_ticker_only_from_whitelist() {
        assert_eq!(parse("我觉得nvda会涨").ticker.as_deref(), Some("NVDA"));
        assert_eq!(parse("我觉得abcd会涨").ticker, None);
    }

    #[test]
    fn name_table_wins_over_symbol_token() {
        let i = parse("苹果 vs MSFT 看涨");
        assert_eq!(i.ticker.as_deref(), Some("AAPL"));
    }

    #[test]
    fn unmatched_text_gets_defaults_and_zero_confidence() {
        let i = parse("hello world");
        assert_eq!(i.ticker, None);
        assert_eq!(i.direction, None);
        assert_eq!(i.strength, Strength::Moderate);
        assert_eq!(i.timeframe, Timeframe::Short);
        assert_eq!(i.risk_profile, RiskProfile::Balanced);
        assert_eq!(i.confidence, 0.0);
        assert_eq!(i.explicit, ExplicitFields::default());
    }

    #[test]
    fn most_hits_wins_direction() {
        // two bearish hits (看空, 做空) against one bullish (涨)
        let i = parse("大家都说涨，我看空，准备做空");
        assert_eq!(i.direction, Some(Direction::Bearish));
    }

    #[test]
    fn confidence_is_capped() {
        let i = parse("特斯拉强烈看涨，短期，激进");
        assert_eq!(i.confidence, 1.0);
    }

    #[test]
    fn parse_is_deterministic() {
        let ex = IntentExtractor::new();
        let text = "英伟达长期看多，但要保守一点";
        assert_eq!(ex.parse(text), ex.parse(text));
    }
}
