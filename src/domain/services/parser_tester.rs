use super::*;
use crate::models::{EasySerialParserSettings, ParserTestOutcome};
use tokio_util::sync::CancellationToken;

/// 解析器测试接口
///
/// 只读操作，使用给定设置解析一段原始文本，不会修改编辑会话。
/// 实现应在 `cancel` 被触发时尽快返回 `AppError::Cancelled`。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IParserTester: Send + Sync {
    async fn test_parser(
        &self,
        raw_text: String,
        settings: EasySerialParserSettings,
        cancel: CancellationToken,
    ) -> AppResult<ParserTestOutcome>;
}
