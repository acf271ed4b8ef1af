//! Advisory messages for a diagnosed tier.
//!
//! Order matters and is part of the contract:
//! identity check, then personal info / money / authority / link (each only if
//! detected), then the report-to-authorities line for high and critical.

use std::collections::BTreeSet;

use super::patterns::Category;
use super::risk::RiskLevel;

pub const STAY_CAUTIOUS: &str = "의심스러운 패턴이 발견되지 않았습니다. 하지만 항상 주의하세요!";
pub const VERIFY_SENDER: &str = "⚠️ 발신자의 신원을 반드시 확인하세요.";
pub const NEVER_SHARE_PERSONAL_INFO: &str = "🚫 절대 개인정보를 제공하지 마세요.";
pub const NEVER_SEND_MONEY: &str = "💰 금전 요구는 99% 사기입니다. 송금하지 마세요.";
pub const VERIFY_VIA_OFFICIAL_NUMBER: &str =
    "📞 공공기관은 문자로 개인정보를 요구하지 않습니다. 공식 번호로 직접 확인하세요.";
pub const DO_NOT_CLICK_LINKS: &str = "🔗 의심스러운 링크는 절대 클릭하지 마세요.";
pub const REPORT_TO_POLICE: &str =
    "🚨 즉시 삭제하고, 필요시 경찰청 사이버안전국(182)에 신고하세요.";

/// Category-specific advice, in emission order.
const CATEGORY_ADVICE: [(Category, &str); 4] = [
    (Category::PersonalInfo, NEVER_SHARE_PERSONAL_INFO),
    (Category::Money, NEVER_SEND_MONEY),
    (Category::Authority, VERIFY_VIA_OFFICIAL_NUMBER),
    (Category::Link, DO_NOT_CLICK_LINKS),
];

/// Build the ordered advice list. Never empty.
pub fn recommendations(level: RiskLevel, detected: &BTreeSet<Category>) -> Vec<String> {
    if level == RiskLevel::Safe {
        return vec![STAY_CAUTIOUS.to_string()];
    }

    let mut out = vec![VERIFY_SENDER.to_string()];
    out.extend(
        CATEGORY_ADVICE
            .iter()
            .filter(|(cat, _)| detected.contains(cat))
            .map(|(_, msg)| msg.to_string()),
    );
    if level.is_severe() {
        out.push(REPORT_TO_POLICE.to_string());
    }
    out
}
