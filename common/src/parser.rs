//! AI回答パーサー
//!
//! モデルの返答テキストから回答JSONを取り出す。
//! どんな入力でもパニックせず、必ず `ParsedReply` を返す。
//!
//! 処理順:
//! 1. 前後の空白と ```json / ``` のコードフェンスを除去
//! 2. 最初の `{` から最後の `}` までを切り出し
//! 3. JSONとしてデコードし4フィールドを取り出す
//!
//! フォールバック:
//! - 空の返答 → 回答に「回答を生成できませんでした」
//! - `{...}` が無い → 回答に返答全文
//! - デコード失敗 → 回答に返答全文、サマリに「JSON解析エラー」

use crate::types::{
    ParsedReply, FIELD_ANSWER, FIELD_ARRANGED_KEYWORD, FIELD_ORIGINAL_KEYWORD, FIELD_RELATION,
    FIELD_SUMMARY,
};
use serde_json::{Map, Value};

/// 返答が空のときの回答
pub const NO_ANSWER_SENTINEL: &str = "回答を生成できませんでした";

/// JSONデコードに失敗したときのサマリ
pub const DECODE_ERROR_SENTINEL: &str = "JSON解析エラー";

/// 前後のコードフェンスを除去
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// 最初の `{` から最後の `}` まで
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// 1質問分の返答をパース
pub fn parse_reply(text: &str) -> ParsedReply {
    let cleaned = strip_code_fence(text);
    if cleaned.is_empty() {
        return ParsedReply::answer_only(NO_ANSWER_SENTINEL);
    }

    let Some(json) = extract_json_object(cleaned) else {
        return ParsedReply::answer_only(text.trim());
    };

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => reply_from_object(&map),
        _ => decode_error_reply(text),
    }
}

/// 連続質問モードの返答
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequentialReply {
    /// 要求したIDと同じ並び・同じ件数
    pub answers: Vec<ParsedReply>,
    /// 組み合わせ全体の関連性コメント
    pub relation: String,
}

/// 連続質問モードの返答をパース
///
/// 各要素は `id` で突き合わせ、見つからなかったIDには未使用の要素を順に割り当てる。
/// 1つの要素は1つのIDにしか使わない。残りが無ければ「回答を生成できませんでした」。
/// `回答` 配列を持つオブジェクトでなければ、全IDに `parse_reply` と同じフォールバックを返す
pub fn parse_sequential_reply(text: &str, ids: &[&str]) -> SequentialReply {
    let fallback = || SequentialReply {
        answers: ids.iter().map(|_| parse_reply(text)).collect(),
        relation: String::new(),
    };

    let Some(json) = extract_json_object(strip_code_fence(text)) else {
        return fallback();
    };
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(json) else {
        return fallback();
    };
    let Some(Value::Array(items)) = map.get(FIELD_ANSWER) else {
        return fallback();
    };

    let answers = assign_items(items, ids)
        .into_iter()
        .map(|item| {
            item.and_then(Value::as_object)
                .map(reply_from_object)
                .unwrap_or_else(|| ParsedReply::answer_only(NO_ANSWER_SENTINEL))
        })
        .collect();

    SequentialReply {
        answers,
        relation: field_text(&map, FIELD_RELATION),
    }
}

fn reply_from_object(map: &Map<String, Value>) -> ParsedReply {
    ParsedReply {
        answer: field_text(map, FIELD_ANSWER),
        summary: field_text(map, FIELD_SUMMARY),
        original_keyword: field_text(map, FIELD_ORIGINAL_KEYWORD),
        arranged_keyword: field_text(map, FIELD_ARRANGED_KEYWORD),
    }
}

fn decode_error_reply(text: &str) -> ParsedReply {
    ParsedReply {
        answer: text.trim().to_string(),
        summary: DECODE_ERROR_SENTINEL.to_string(),
        ..Default::default()
    }
}

/// 文字列はそのまま、null・欠損は空、それ以外はJSON表記
fn field_text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// 要求IDごとに配列の要素を割り当てる
///
/// 1周目はIDの一致（同じIDが複数あれば出現順に別の要素）、
/// 2周目は残ったIDに未使用の要素を並び順で。
fn assign_items<'a>(items: &'a [Value], ids: &[&str]) -> Vec<Option<&'a Value>> {
    let mut used = vec![false; items.len()];
    let mut assigned: Vec<Option<&Value>> = vec![None; ids.len()];

    for (slot, id) in ids.iter().enumerate() {
        let found = (0..items.len())
            .find(|&i| !used[i] && item_id(&items[i]).as_deref() == Some(*id));
        if let Some(i) = found {
            used[i] = true;
            assigned[slot] = Some(&items[i]);
        }
    }

    // IDが要求IDのどれとも一致しない要素だけを順番の穴埋めに使う
    let mut spare = items.iter().enumerate().filter(|(i, item)| {
        !used[*i] && !item_id(item).is_some_and(|id| ids.contains(&id.as_str()))
    });
    for slot in assigned.iter_mut().filter(|slot| slot.is_none()) {
        match spare.next() {
            Some((_, item)) => *slot = Some(item),
            None => break,
        }
    }

    assigned
}

fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // strip_code_fence / extract_json_object
    // =============================================

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(
            extract_json_object("結果です: {\"a\": {\"b\": 1}} 以上"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} reversed {"), None);
    }

    // =============================================
    // parse_reply
    // =============================================

    #[test]
    fn test_parse_reply_plain_json() {
        let text = r#"{"回答":"良い年になります","サマリ":"好調","元キーワード":"太陽","アレンジキーワード":"輝き"}"#;
        let reply = parse_reply(text);
        assert_eq!(reply.answer, "良い年になります");
        assert_eq!(reply.summary, "好調");
        assert_eq!(reply.original_keyword, "太陽");
        assert_eq!(reply.arranged_keyword, "輝き");
    }

    #[test]
    fn test_parse_reply_fenced_with_prose() {
        let text = "```json\nはい、結果です。\n{\"回答\": \"A\", \"サマリ\": \"S\"}\n```";
        let reply = parse_reply(text);
        assert_eq!(reply.answer, "A");
        assert_eq!(reply.summary, "S");
        assert_eq!(reply.original_keyword, "");
    }

    #[test]
    fn test_parse_reply_fence_does_not_change_result() {
        let payload = r#"{"回答": "流れに任せて", "サマリ": "好転", "元キーワード": "月", "アレンジキーワード": "月明かり"}"#;
        for fenced in [
            format!("```json\n{}\n```", payload),
            format!("```\n{}\n```", payload),
        ] {
            assert_eq!(parse_reply(&fenced), parse_reply(payload));
        }
    }

    #[test]
    fn test_parse_reply_fenced_with_surrounding_whitespace() {
        let text = "  \n```json\n{\"回答\":\"X\",\"サマリ\":\"Y\",\"元キーワード\":\"\",\"アレンジキーワード\":\"\"}\n```\n  ";
        let reply = parse_reply(text);
        assert_eq!(
            reply,
            ParsedReply {
                answer: "X".to_string(),
                summary: "Y".to_string(),
                original_keyword: String::new(),
                arranged_keyword: String::new(),
            }
        );
    }

    #[test]
    fn test_parse_reply_empty() {
        assert_eq!(parse_reply("").answer, NO_ANSWER_SENTINEL);
        assert_eq!(parse_reply("  \n ").answer, NO_ANSWER_SENTINEL);
        assert_eq!(parse_reply("```json\n```").answer, NO_ANSWER_SENTINEL);
    }

    #[test]
    fn test_parse_reply_no_json() {
        let reply = parse_reply("今日はゆっくり休みましょう。");
        assert_eq!(reply.answer, "今日はゆっくり休みましょう。");
        assert_eq!(reply.summary, "");
    }

    #[test]
    fn test_parse_reply_decode_error() {
        let text = "{\"回答\": \"途中で切れた";
        let reply = parse_reply(&format!("{}}}", text));
        assert_eq!(reply.summary, DECODE_ERROR_SENTINEL);
        assert!(reply.answer.starts_with("{\"回答\""));
    }

    #[test]
    fn test_parse_reply_non_string_fields() {
        let reply = parse_reply(r#"{"回答": 42, "サマリ": null, "元キーワード": true}"#);
        assert_eq!(reply.answer, "42");
        assert_eq!(reply.summary, "");
        assert_eq!(reply.original_keyword, "true");
    }

    #[test]
    fn test_parse_reply_non_object_json() {
        let reply = parse_reply("{1, 2}");
        assert_eq!(reply.summary, DECODE_ERROR_SENTINEL);
    }

    // =============================================
    // parse_sequential_reply
    // =============================================

    #[test]
    fn test_parse_sequential_reply_by_id() {
        let text = r#"{
  "回答": [
    {"id": "Q2", "回答": "二つ目", "サマリ": "s2"},
    {"id": "Q1", "回答": "一つ目", "サマリ": "s1"}
  ],
  "関連性": "出会いから発展へ"
}"#;
        let reply = parse_sequential_reply(text, &["Q1", "Q2"]);
        assert_eq!(reply.answers.len(), 2);
        assert_eq!(reply.answers[0].answer, "一つ目");
        assert_eq!(reply.answers[1].answer, "二つ目");
        assert_eq!(reply.relation, "出会いから発展へ");
    }

    #[test]
    fn test_parse_sequential_reply_positional_and_missing() {
        let text = r#"{"回答": [{"id": 1, "回答": "数値ID"}, {"回答": "IDなし"}]}"#;
        let reply = parse_sequential_reply(text, &["1", "X", "Y"]);
        assert_eq!(reply.answers[0].answer, "数値ID");
        assert_eq!(reply.answers[1].answer, "IDなし");
        assert_eq!(reply.answers[2].answer, NO_ANSWER_SENTINEL);
        assert_eq!(reply.relation, "");
    }

    #[test]
    fn test_parse_sequential_reply_omitted_id_gets_sentinel() {
        let text = r#"{"回答": [{"id": "Q2", "回答": "二つ目の答え"}]}"#;
        let reply = parse_sequential_reply(text, &["Q1", "Q2"]);
        assert_eq!(reply.answers[0].answer, NO_ANSWER_SENTINEL);
        assert_eq!(reply.answers[1].answer, "二つ目の答え");
    }

    #[test]
    fn test_parse_sequential_reply_repeated_id() {
        let text = r#"{"回答": [{"id": "Q1", "回答": "A"}, {"id": "Q1", "回答": "B"}]}"#;
        let reply = parse_sequential_reply(text, &["Q1", "Q1"]);
        assert_eq!(reply.answers[0].answer, "A");
        assert_eq!(reply.answers[1].answer, "B");

        // 足りない分は使い回さない
        let reply = parse_sequential_reply(r#"{"回答": [{"id": "Q1", "回答": "A"}]}"#, &["Q1", "Q1"]);
        assert_eq!(reply.answers[0].answer, "A");
        assert_eq!(reply.answers[1].answer, NO_ANSWER_SENTINEL);
    }

    #[test]
    fn test_parse_sequential_reply_unknown_ids_fill_in_order() {
        let text = r#"{"回答": [
            {"id": "質問1", "回答": "一"},
            {"id": "Q2", "回答": "二"},
            {"id": "質問3", "回答": "三"}
        ]}"#;
        let reply = parse_sequential_reply(text, &["Q1", "Q2", "Q3"]);
        let answers: Vec<&str> = reply.answers.iter().map(|a| a.answer.as_str()).collect();
        assert_eq!(answers, vec!["一", "二", "三"]);
    }

    #[test]
    fn test_parse_sequential_reply_invalid_payload() {
        let reply = parse_sequential_reply("すみません、回答できません", &["Q1", "Q2"]);
        assert_eq!(reply.answers.len(), 2);
        assert!(reply
            .answers
            .iter()
            .all(|a| a.answer == "すみません、回答できません"));

        let reply = parse_sequential_reply(r#"{"回答": "配列ではない"}"#, &["Q1"]);
        assert_eq!(reply.answers[0].answer, "配列ではない");
    }
}
