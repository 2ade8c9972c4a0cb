//! # SQL查询模板编译
//!
//! ## 业务说明
//! 日志器写库时使用的查询模板以 `{name}` 作为占位符，
//! 编译后占位符被替换为 `:name` 形式的命名参数。
//!
//! 语法：
//! - `{var}` → `:var`，`var` 必须是合法标识符
//! - `{{` → `{`，`}}` → `}`
//! - 单独的 `}`、未闭合的 `{`、空占位符都是错误

use std::collections::BTreeSet;

use crate::utils::error::{AppError, AppResult};

/// 编译后的查询模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQueryTemplate {
    /// 使用 `:name` 参数的SQL
    pub sql: String,
    /// 模板中出现的参数名
    pub param_names: BTreeSet<String>,
}

/// 编译查询模板
pub fn compile(template: &str) -> AppResult<CompiledQueryTemplate> {
    let chars: Vec<char> = template.chars().collect();
    let mut sql = String::with_capacity(template.len());
    let mut param_names = BTreeSet::new();

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                if chars.get(i + 1) == Some(&'{') {
                    sql.push('{');
                    i += 2;
                    continue;
                }

                let close = chars[i + 1..]
                    .iter()
                    .position(|c| *c == '}')
                    .map(|offset| i + 1 + offset)
                    .ok_or_else(|| AppError::validation_error("查询模板中存在未闭合的 '{'"))?;

                let name: String = chars[i + 1..close].iter().collect::<String>().trim().to_string();
                if name.is_empty() {
                    return Err(AppError::validation_error("查询模板中存在空占位符 '{}'"));
                }
                if !is_identifier(&name) {
                    return Err(AppError::validation_error(format!(
                        "查询模板中的占位符名称无效: '{}'",
                        name
                    )));
                }

                sql.push(':');
                sql.push_str(&name);
                param_names.insert(name);
                i = close + 1;
            }
            '}' => {
                if chars.get(i + 1) == Some(&'}') {
                    sql.push('}');
                    i += 2;
                    continue;
                }
                return Err(AppError::validation_error("查询模板中存在单独的 '}'"));
            }
            ch => {
                sql.push(ch);
                i += 1;
            }
        }
    }

    Ok(CompiledQueryTemplate { sql, param_names })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}
