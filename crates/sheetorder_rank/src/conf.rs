//! Ordering constants and default rule factories.

use std::collections::BTreeMap;

use crate::spec::{SpecClassifyPolicy, SpecOrderRules, SpecTimeSortPolicy};

/// Canonical college order; buckets are emitted in this sequence.
pub const L_COLLEGE_ORDER_DEFAULT: [&str; 10] = [
    "经济与管理学院",
    "法学院",
    "文学与传媒学院",
    "数据科学与人工智能学院",
    "电子与电气工程学院",
    "机器人工程学院",
    "建筑与能源工程学院",
    "设计艺术学院",
    "外国语学院",
    "创新创业学院",
];

/// Short or legacy college spellings and their canonical label.
pub const TUP_COLLEGE_ALIASES_DEFAULT: [(&str, &str); 14] = [
    ("经管学院", "经济与管理学院"),
    ("文传学院", "文学与传媒学院"),
    ("电电学院", "电子与电气工程学院"),
    ("建工学院", "建筑与能源工程学院"),
    ("外院", "外国语学院"),
    ("设艺学院", "设计艺术学院"),
    ("创业学院", "创新创业学院"),
    ("数智学院", "数据科学与人工智能学院"),
    ("电子与电气工程", "电子与电气工程学院"),
    ("创新与创业学院", "创新创业学院"),
    ("建筑与能源工程", "建筑与能源工程学院"),
    ("经管", "经济与管理学院"),
    ("数据科学与人工智能", "数据科学与人工智能学院"),
    ("数智", "数据科学与人工智能学院"),
];

/// Column holding the college label.
pub const C_COLUMN_CATEGORY_DEFAULT: &str = "学院";

/// Name fragments marking identifier-like columns (matched lower-cased).
pub const L_KEYWORDS_TEXT_COLUMN_DEFAULT: [&str; 27] = [
    "学号", "工号", "编号", "证件号", "身份证", "手机", "电话", "联系方式", "账号", "帐号",
    "卡号", "序列号", "订单号", "单号", "票号", "邮编", "邮政编码", "id", "phone", "tel",
    "mobile", "account", "serial", "order", "ticket", "zip", "postcode",
];
/// Non-missing values inspected by the value-based text rule.
pub const N_SAMPLES_TEXT_VALUE_DEFAULT: usize = 5;
/// Minimum digit count for a value to count as a long identifier.
pub const N_LEN_DIGITS_TEXT_MIN_DEFAULT: usize = 8;

/// Name fragments marking a date/time column (matched lower-cased).
pub const L_KEYWORDS_TIME_COLUMN_DEFAULT: [&str; 9] = [
    "时间", "date", "开始时间", "结束时间", "开始", "结束", "日期", "备注", "time",
];
/// Parsed fraction that must be strictly exceeded to sort by parsed time.
pub const N_RATIO_TIME_PARSED_MIN_DEFAULT: f64 = 0.5;

/// Default output file name for college order.
pub const C_FILE_NAME_COLLEGE: &str = "按学院排序.xlsx";
/// Default output file name for time order.
pub const C_FILE_NAME_TIME: &str = "按时间排序.xlsx";

/// Build the compiled-in college rules.
pub fn derive_default_order_rules() -> SpecOrderRules {
    SpecOrderRules {
        column_category: C_COLUMN_CATEGORY_DEFAULT.to_string(),
        order: L_COLLEGE_ORDER_DEFAULT
            .iter()
            .map(ToString::to_string)
            .collect(),
        aliases: TUP_COLLEGE_ALIASES_DEFAULT
            .iter()
            .map(|(c_alias, c_canonical)| (c_alias.to_string(), c_canonical.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Build the compiled-in text-column classification policy.
pub fn derive_default_classify_policy() -> SpecClassifyPolicy {
    SpecClassifyPolicy {
        keywords: L_KEYWORDS_TEXT_COLUMN_DEFAULT
            .iter()
            .map(ToString::to_string)
            .collect(),
        n_samples: N_SAMPLES_TEXT_VALUE_DEFAULT,
        n_len_digits_min: N_LEN_DIGITS_TEXT_MIN_DEFAULT,
    }
}

/// Build the compiled-in time sorting policy.
pub fn derive_default_time_sort_policy() -> SpecTimeSortPolicy {
    SpecTimeSortPolicy {
        keywords: L_KEYWORDS_TIME_COLUMN_DEFAULT
            .iter()
            .map(ToString::to_string)
            .collect(),
        thr_ratio_parsed_min: N_RATIO_TIME_PARSED_MIN_DEFAULT,
    }
}
