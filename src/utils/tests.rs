use crate::utils::error::{AppError, AppResult};

/// 测试AppError的创建和错误代码
#[test]
fn test_app_error_creation() {
    let error = AppError::generic("测试错误");
    assert_eq!(error.error_code(), "GENERIC");
    assert!(error.to_string().contains("测试错误"));

    let conflict = AppError::conflict_error("名称 'Scale-1' 已存在");
    assert_eq!(conflict.error_code(), "CONFLICT_ERROR");
    assert!(conflict.to_string().contains("Scale-1"));

    let io_error = AppError::io_error("文件读取失败", "Unknown");
    assert_eq!(io_error.error_code(), "IO_ERROR");
    assert!(io_error.to_string().contains("文件读取失败"));
}

/// 测试错误分类辅助方法
#[test]
fn test_error_classification() {
    assert!(AppError::cancelled("parser_test").is_cancelled());
    assert!(!AppError::network_error("超时").is_cancelled());

    assert!(AppError::structural_error("未注册的类型").is_fatal());
    assert!(!AppError::validation_error("名称不能为空").is_fatal());

    assert!(AppError::validation_error("名称不能为空").is_validation());
}

/// 测试错误转换 (From trait)
#[test]
fn test_error_conversion() {
    let string_error: AppError = String::from("字符串错误").into();
    assert_eq!(string_error.error_code(), "GENERIC");

    let str_error: AppError = "字符串错误".into();
    assert_eq!(str_error.error_code(), "GENERIC");

    let json_error: Result<serde_json::Value, serde_json::Error> = serde_json::from_str("{invalid json}");
    match json_error {
        Err(e) => {
            let app_error: AppError = e.into();
            assert_eq!(app_error.error_code(), "JSON_ERROR");
        }
        Ok(_) => panic!("应该产生JSON错误"),
    }

    let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert_eq!(io.error_code(), "IO_ERROR");
}

/// 测试AppResult别名配合 ? 使用
#[test]
fn test_app_result_propagation() {
    fn parse(raw: &str) -> AppResult<serde_json::Value> {
        Ok(serde_json::from_str(raw)?)
    }

    assert!(parse("{\"a\": 1}").is_ok());
    assert_eq!(parse("oops").unwrap_err().error_code(), "JSON_ERROR");
}
