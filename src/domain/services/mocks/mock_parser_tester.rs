use super::*;
use crate::models::{EasySerialParserSettings, ParsedFieldValue, ParserTestOutcome};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Mock解析器测试
///
/// 按分隔符切分原始文本并按字段下标取值，
/// 在 `response_delay` 期间响应取消令牌
#[derive(Debug, Clone)]
pub struct MockParserTester {
    base: MockServiceBase,
    response_delay: Duration,
}

impl MockParserTester {
    pub fn new(config: MockConfig, response_delay: Duration) -> Self {
        Self {
            base: MockServiceBase::new(config),
            response_delay,
        }
    }

    fn parse(raw_text: &str, settings: &EasySerialParserSettings) -> AppResult<ParserTestOutcome> {
        let payload = raw_text.trim_end_matches(settings.terminator.as_str());
        let payload = match settings.preamble.as_deref() {
            Some(preamble) => payload
                .strip_prefix(preamble)
                .ok_or_else(|| AppError::business_logic_error("未找到完整的数据帧（检查前导符/结束符）"))?,
            None => payload,
        };

        let parts: Vec<&str> = payload.split(settings.separator.as_str()).collect();
        let fields = settings
            .fields
            .iter()
            .map(|field| {
                let raw = usize::try_from(field.index)
                    .ok()
                    .and_then(|i| parts.get(i))
                    .ok_or_else(|| {
                        AppError::business_logic_error(format!("字段 '{}' 的下标 {} 超出范围", field.name, field.index))
                    })?;
                Ok(ParsedFieldValue {
                    name: field.name.clone(),
                    value: serde_json::Value::String(raw.trim().to_string()),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(ParserTestOutcome { fields })
    }
}

impl MockService for MockParserTester {
    fn mock_base(&self) -> &MockServiceBase {
        &self.base
    }
}

#[async_trait]
impl IParserTester for MockParserTester {
    async fn test_parser(
        &self,
        raw_text: String,
        settings: EasySerialParserSettings,
        cancel: CancellationToken,
    ) -> AppResult<ParserTestOutcome> {
        let parameters = serde_json::json!({ "raw_text": raw_text });

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(AppError::cancelled("解析器测试")),
            _ = tokio::time::sleep(self.response_delay) => {
                match self.base.take_injected_error("test_parser") {
                    Some(error) => Err(error),
                    None => Self::parse(&raw_text, &settings),
                }
            }
        };

        let summary = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        self.base.record_call("test_parser", parameters, &summary);
        result
    }
}
