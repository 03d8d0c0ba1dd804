use serde_json::{Value, json};

use super::error::{DifyError, Result};

const QUERY_HEADER: &str = "Please modify the following text according to the instruction. \
Return only the modified text, without any explanation:";

pub fn build_query(text: &str, instruction: &str) -> String {
    format!(
        "{QUERY_HEADER}\n\n\
         Original text:\n{text}\n\n\
         Instruction:\n{instruction}\n\n\
         Modified text:"
    )
}

pub fn build_payload(text: &str, instruction: &str, user: &str) -> Value {
    json!({
        "inputs": {},
        "query": build_query(text, instruction),
        "response_mode": "blocking",
        "user": user,
    })
}

/// Trimmed `answer`. An absent or blank answer is no result; a response that
/// is not an object, or an `answer` that is not a string, is malformed.
pub fn extract_answer(response: &Value) -> Result<String> {
    let object = response
        .as_object()
        .ok_or_else(|| DifyError::Unexpected("response is not a JSON object".to_string()))?;

    let answer = match object.get("answer") {
        None => "",
        Some(Value::String(answer)) => answer.trim(),
        Some(_) => {
            return Err(DifyError::Unexpected(
                "`answer` in the response is not a string".to_string(),
            ));
        }
    };

    if answer.is_empty() {
        return Err(DifyError::EmptyAnswer);
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_embeds_text_and_instruction() {
        let query = build_query("the moon is big", "make it formal");
        assert_eq!(
            query,
            "Please modify the following text according to the instruction. Return only the modified text, without any explanation:\n\n\
             Original text:\nthe moon is big\n\n\
             Instruction:\nmake it formal\n\n\
             Modified text:"
        );
    }

    #[test]
    fn payload_shape() {
        let payload = build_payload("a", "b", "text-rewrite-chat-user");
        assert_eq!(payload["inputs"], json!({}));
        assert_eq!(payload["response_mode"], "blocking");
        assert_eq!(payload["user"], "text-rewrite-chat-user");
        assert!(payload["query"].as_str().unwrap().contains("Original text:\na\n"));
    }

    #[test]
    fn answer_is_trimmed() {
        let response = json!({ "answer": "  Z  ", "conversation_id": "c-1" });
        assert_eq!(extract_answer(&response).unwrap(), "Z");
    }

    #[test]
    fn blank_or_missing_answer_fails() {
        assert!(matches!(
            extract_answer(&json!({ "answer": " \n\t" })),
            Err(DifyError::EmptyAnswer)
        ));
        assert!(matches!(
            extract_answer(&json!({ "message_id": "m-1" })),
            Err(DifyError::EmptyAnswer)
        ));
    }

    #[test]
    fn non_object_response_or_answer_is_malformed() {
        for response in [
            json!([1, 2]),
            json!(null),
            json!("Z"),
            json!({ "answer": null }),
            json!({ "answer": ["Z"] }),
        ] {
            let err = extract_answer(&response).unwrap_err();
            assert!(matches!(err, DifyError::Unexpected(_)), "{response}: {err:?}");
            assert!(err.to_string().starts_with("Dify text rewrite failed: "));
        }
    }
}
