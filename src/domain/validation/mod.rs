//! # 表单校验规则引擎
//!
//! ## 业务说明
//! 校验规则按字段路径声明在规则表中（见 [`rules`]），每条规则可以带一个
//! 兄弟字段条件，例如"`enabled` 为真时数据库用户必填"。
//! 引擎本身是纯函数：输入表单值和规则表，输出 字段路径 → 错误消息。
//!
//! ## 规则分组
//! - **公共规则**: 名称、数据库写入组、查询模板
//! - **类型规则**: 由类型注册表中每个类型的规则工厂提供
//!
//! 条件不成立时整条规则跳过，因此关闭开关后重新校验即可清除该组错误，
//! 已输入的值保持不变。

pub mod rules;

use crate::domain::query_template;
use crate::domain::registry::LoggerTypeRegistry;
use crate::models::{FieldErrors, FormValues};
use crate::utils::error::AppResult;

pub use rules::{common_rules, DB_WRITE_ENABLED, EXT_COUNTER_ENABLED};

/// 参与校验的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(Option<i64>),
    Float(f64),
    Bool(bool),
}

/// 字段取值函数：返回 (具体字段路径, 值) 列表，列表字段每一行产生一项
pub type FieldAccessor = fn(&FormValues) -> Vec<(String, FieldValue)>;

/// 兄弟字段条件
#[derive(Clone, Copy)]
pub struct SiblingCondition {
    /// 条件依赖的字段路径
    pub sibling: &'static str,
    pub holds: fn(&FormValues) -> bool,
}

impl std::fmt::Debug for SiblingCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiblingCondition").field("sibling", &self.sibling).finish()
    }
}

/// 可复用的字段检查
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// 必填：文本非空白、可选整数已选择
    Required,
    /// 不能为空串（空白字符本身是合法取值，用于分隔符/结束符）
    NotEmpty,
    /// 正整数（≥1）
    PositiveInteger,
    /// 非负整数
    NonNegativeInteger,
    /// 整数且在闭区间内
    IntegerRange { min: i64, max: i64 },
    /// 数值 ≥ 下限
    AtLeast(f64),
    /// 数值 > 下限
    GreaterThan(f64),
    /// 小数位数上限
    MaxDecimals(u32),
    /// 取值必须在候选列表中
    OneOf(&'static [&'static str]),
    /// 非空时必须能编译为查询模板
    QueryTemplate,
}

/// 判断数值的小数位是否不超过 `places` 位
///
/// 使用 `|v·10ⁿ − round(v·10ⁿ)| < 1e-6` 吸收二进制浮点误差
pub fn has_max_decimals(value: f64, places: u32) -> bool {
    let scaled = value * 10f64.powi(places as i32);
    (scaled - scaled.round()).abs() < 1e-6
}

fn numeric(value: &FieldValue) -> Option<Option<f64>> {
    match value {
        FieldValue::Int(v) => Some(v.map(|v| v as f64)),
        FieldValue::Float(v) => Some(Some(*v)),
        FieldValue::Text(s) if s.trim().is_empty() => Some(None),
        FieldValue::Text(s) => s.trim().parse::<f64>().ok().map(Some),
        FieldValue::Bool(_) => None,
    }
}

fn is_integer(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0
}

impl Check {
    /// 执行检查，失败时返回默认错误消息
    ///
    /// 数值类检查遇到空值时通过，空值由 `Required` 负责
    pub fn apply(&self, value: &FieldValue) -> Result<(), String> {
        match self {
            Check::Required => {
                let present = match value {
                    FieldValue::Text(s) => !s.trim().is_empty(),
                    FieldValue::Int(v) => v.is_some(),
                    FieldValue::Float(v) => v.is_finite(),
                    FieldValue::Bool(_) => true,
                };
                if present { Ok(()) } else { Err("此项为必填项".to_string()) }
            }
            Check::NotEmpty => match value {
                FieldValue::Text(s) if s.is_empty() => Err("此项为必填项".to_string()),
                _ => Ok(()),
            },
            Check::OneOf(allowed) => match value {
                FieldValue::Text(s) if allowed.contains(&s.as_str()) => Ok(()),
                _ => Err(format!("取值必须为: {}", allowed.join(", "))),
            },
            Check::QueryTemplate => match value {
                FieldValue::Text(s) if s.trim().is_empty() => Ok(()),
                FieldValue::Text(s) => query_template::compile(s)
                    .map(|_| ())
                    .map_err(|e| match e {
                        crate::utils::error::AppError::ValidationError { message } => message,
                        other => other.to_string(),
                    }),
                _ => Ok(()),
            },
            numeric_check => {
                let v = match numeric(value) {
                    Some(Some(v)) => v,
                    Some(None) => return Ok(()),
                    None => return Err("请输入数字".to_string()),
                };
                match numeric_check {
                    Check::PositiveInteger if !(is_integer(v) && v >= 1.0) => {
                        Err("必须为正整数".to_string())
                    }
                    Check::NonNegativeInteger if !(is_integer(v) && v >= 0.0) => {
                        Err("必须为非负整数".to_string())
                    }
                    Check::IntegerRange { min, max }
                        if !(is_integer(v) && v >= *min as f64 && v <= *max as f64) =>
                    {
                        Err(format!("必须为 {} 到 {} 之间的整数", min, max))
                    }
                    Check::AtLeast(min) if v < *min => Err(format!("不能小于 {}", min)),
                    Check::GreaterThan(min) if v <= *min => Err(format!("必须大于 {}", min)),
                    Check::MaxDecimals(places) if !has_max_decimals(v, *places) => {
                        Err(format!("最多保留 {} 位小数", places))
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

/// 一条字段规则
#[derive(Debug, Clone)]
pub struct FieldRule {
    /// 字段路径（列表字段以 `[]` 表示任意行）
    pub field: &'static str,
    pub values: FieldAccessor,
    pub condition: Option<SiblingCondition>,
    pub checks: Vec<Check>,
    /// 覆盖检查失败时的默认消息
    pub message: Option<&'static str>,
}

impl FieldRule {
    pub fn new(field: &'static str, values: FieldAccessor) -> Self {
        Self {
            field,
            values,
            condition: None,
            checks: Vec::new(),
            message: None,
        }
    }

    /// 仅在兄弟字段条件成立时生效
    pub fn when(mut self, condition: SiblingCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// 规则在当前表单值下是否生效
    pub fn is_active(&self, values: &FormValues) -> bool {
        self.condition.map_or(true, |c| (c.holds)(values))
    }

    pub fn depends_on(&self, sibling: &str) -> bool {
        self.condition.map_or(false, |c| c.sibling == sibling)
    }
}

/// 按规则表校验表单值
///
/// 每个字段只记录第一条失败消息
pub fn evaluate(values: &FormValues, rules: &[FieldRule]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in rules.iter().filter(|r| r.is_active(values)) {
        for (path, value) in (rule.values)(values) {
            if errors.contains_key(&path) {
                continue;
            }
            if let Some(default_message) = rule.checks.iter().find_map(|c| c.apply(&value).err()) {
                let message = rule.message.map(str::to_string).unwrap_or(default_message);
                errors.insert(path, message);
            }
        }
    }
    errors
}

/// 校验整个表单：公共规则 + 当前类型的规则
///
/// 当前类型未在注册表中时返回结构性错误
pub fn validate_form(values: &FormValues, registry: &LoggerTypeRegistry) -> AppResult<FieldErrors> {
    let descriptor = registry.descriptor(values.logger_type())?;
    let mut rules = common_rules();
    rules.extend((descriptor.rules)());
    Ok(evaluate(values, &rules))
}

/// 清除依赖某个兄弟字段的所有规则产生的错误
pub fn clear_dependent_errors(errors: &mut FieldErrors, rules: &[FieldRule], sibling: &str) {
    for rule in rules.iter().filter(|r| r.depends_on(sibling)) {
        errors.remove(rule.field);
    }
}
