/// 临时通知接口
///
/// 只用于传输/业务错误和操作结果提示，字段校验错误不走通知
#[cfg_attr(test, mockall::automock)]
pub trait INotifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}
