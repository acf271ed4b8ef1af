//! Phishing-awareness training: a fixed table of look-alike emails that can be
//! mailed to a trainee. Each scenario carries the tell-tale signs the trainee
//! is shown after following the link.

use serde::Serialize;

pub mod email;

pub use email::{send_phishing_email, TrainingMailer};

/// Placeholder in `body` replaced by the training link.
pub const LINK_PLACEHOLDER: &str = "{{link}}";
/// Error text for an id that is not in the table.
pub const UNKNOWN_SCENARIO: &str = "시나리오를 찾을 수 없습니다.";

/// One simulated phishing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub sender_name: &'static str,
    /// Deliberately wrong look-alike address, shown to the trainee.
    pub sender_email: &'static str,
    pub subject: &'static str,
    /// HTML with one `{{link}}` placeholder.
    pub body: &'static str,
    /// What gives the email away.
    pub explanation: &'static str,
}

static SCENARIOS: [Scenario; 3] = [
    Scenario {
        id: "tax_refund",
        title: "국세청 환급금 안내",
        sender_name: "국세청(NTS)",
        sender_email: "admin@nts-go-kr.com",
        subject: "[공지] 귀하의 미수령 환급금이 발생했습니다. 즉시 확인 바랍니다.",
        body: r#"<div style="font-family: sans-serif; padding: 20px; line-height: 1.6;">
  <h2 style="color: #003366;">미수령 환급금 지급 안내</h2>
  <p>안녕하세요, 국세청입니다.</p>
  <p>귀하에게 지급되지 않은 <b>환급금 458,200원</b>이 발견되었습니다.</p>
  <p>아래 링크를 통해 본인 인증 후 환급 신청을 완료해 주시기 바랍니다.</p>
  <p style="margin: 30px 0;">
    <a href="{{link}}" style="background: #003366; color: white; padding: 12px 25px; text-decoration: none; border-radius: 5px; font-weight: bold;">환급금 신청하기</a>
  </p>
  <p style="color: #ff0000; font-size: 0.9em;">* 오늘 자정까지 신청하지 않을 경우 국고로 환수됩니다.</p>
</div>"#,
        explanation: "발신 주소가 공식 도메인(nts.go.kr)이 아니며, \"오늘 자정까지\"라는 문구로 긴급성을 조성하여 판단을 흐리게 합니다.",
    },
    Scenario {
        id: "account_security",
        title: "네이버 계정 보안 경고",
        sender_name: "네어버 보안팀",
        sender_email: "security@navver.com",
        subject: "[경고] 새로운 기기에서 로그인이 감지되었습니다.",
        body: r#"<div style="font-family: sans-serif; padding: 20px;">
  <img src="https://ssl.pstatic.net/static/pwe/address/img_main_logo.png" width="100" alt="NAVER">
  <h3 style="margin-top: 20px;">비정상적인 로그인이 감지되었습니다.</h3>
  <p>최근 귀하의 계정에 새로운 기기(Windows 10, 서울)에서 접속이 시도되었습니다.</p>
  <p>본인의 시도가 아니라면 아래 버튼을 눌러 계정을 즉시 보호하세요.</p>
  <div style="margin: 25px 0;">
    <a href="{{link}}" style="background: #19ce60; color: white; padding: 10px 20px; text-decoration: none; border-radius: 3px;">계정 보호하기</a>
  </div>
  <p style="font-size: 0.8em; color: #888;">본 메일은 시스템 발신용 메일입니다.</p>
</div>"#,
        explanation: "발신자 이름과 도메인에 미세한 오타가 있습니다. 실제 네이버는 로그인 알림 시 정확한 정보를 제공하며, 링크 주소를 꼼꼼히 확인해야 합니다.",
    },
    Scenario {
        id: "prize_win",
        title: "스타벅스 이벤트 당첨",
        sender_name: "스타벅스 코리아",
        sender_email: "event@star-bucks.kr",
        subject: "[축하] 스타벅스 럭키박스 당첨자로 선정되셨습니다!",
        body: r#"<div style="font-family: sans-serif; padding: 20px; background-color: #f7f7f7;">
  <div style="background: white; border: 1px solid #ddd; padding: 30px;">
    <h2 style="color: #006241;">Congratulations!</h2>
    <p>스타벅스 개점 기념 이벤트에 당첨되신 것을 진심으로 축하드립니다!</p>
    <p><b>경품: 5만원 상당의 럭키박스 (무료배송)</b></p>
    <p>아래 신청 양식을 작성하여 경품을 수령하세요.</p>
    <p style="text-align: center; margin: 30px 0;">
      <a href="{{link}}" style="background: #006241; color: white; padding: 15px 30px; text-decoration: none; border-radius: 50px; font-size: 1.1em;">경품 수령 주소 입력</a>
    </p>
    <p style="font-size: 0.9em;">* 이벤트 기간 내 미입력 시 당첨이 자동 취소됩니다.</p>
  </div>
</div>"#,
        explanation: "공식 이벤트가 아님에도 개인정보(주소, 전화번호 등)를 수집하기 위해 당첨을 빌미로 유혹합니다. 공식 앱이나 홈페이지에서 이벤트를 반드시 확인해야 합니다.",
    },
];

/// All scenarios in table order.
pub fn scenarios() -> &'static [Scenario] {
    &SCENARIOS
}

pub fn find(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

impl Scenario {
    /// Body with the placeholder replaced by `link`.
    pub fn render_body(&self, link: &str) -> String {
        self.body.replacen(LINK_PLACEHOLDER, link, 1)
    }
}

/// Link that lands the trainee on the reveal page for `scenario_id`.
pub fn training_link(base_url: &str, scenario_id: &str) -> String {
    format!("{}/simulations/{scenario_id}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_has_three_unique_ids_with_one_placeholder_each() {
        let ids: HashSet<_> = scenarios().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 3);
        for s in scenarios() {
            assert_eq!(s.body.matches(LINK_PLACEHOLDER).count(), 1, "{}", s.id);
            assert!(!s.explanation.is_empty());
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find("prize_win").map(|s| s.title), Some("스타벅스 이벤트 당첨"));
        assert!(find("lottery").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn link_is_substituted() {
        let s = find("tax_refund").unwrap();
        let html = s.render_body("https://training.example/simulations/tax_refund");
        assert!(html.contains(r#"href="https://training.example/simulations/tax_refund""#));
        assert!(!html.contains(LINK_PLACEHOLDER));
    }

    #[test]
    fn training_link_joins_base_and_id() {
        assert_eq!(
            training_link("http://127.0.0.1:8080/", "account_security"),
            "http://127.0.0.1:8080/simulations/account_security"
        );
        assert_eq!(
            training_link("https://x.example", "tax_refund"),
            "https://x.example/simulations/tax_refund"
        );
    }

    #[test]
    fn scenario_json_is_camel_case() {
        let v = serde_json::to_value(find("tax_refund").unwrap()).unwrap();
        assert_eq!(v["senderEmail"], "admin@nts-go-kr.com");
        assert_eq!(v["senderName"], "국세청(NTS)");
    }
}
