//! `sheetorder_rank` v1:
//! Category-bucket and time ordering of a loaded worksheet.
//!
//! - `conf`      : compiled-in college order, aliases and keyword presets
//! - `spec`      : rules/policies/options and the error taxonomy
//! - `util`      : DataFrame helpers
//! - `classify`  : identifier-like column detection
//! - `normalize` : alias resolution of the category column
//! - `order`     : college buckets and time sort
//! - `report`    : run report
//! - `pipeline`  : load -> classify -> order -> export facade
pub mod classify;
pub mod conf;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod report;
pub mod spec;
pub mod util;

pub use classify::{classify_text_columns, is_text_column_by_name, is_text_column_by_values};
pub use conf::{
    C_COLUMN_CATEGORY_DEFAULT, C_FILE_NAME_COLLEGE, C_FILE_NAME_TIME, L_COLLEGE_ORDER_DEFAULT,
    N_RATIO_TIME_PARSED_MIN_DEFAULT, TUP_COLLEGE_ALIASES_DEFAULT, derive_default_classify_policy,
    derive_default_order_rules, derive_default_time_sort_policy,
};
pub use normalize::{
    derive_normalized_categories, normalize_category_column, normalize_category_value,
};
pub use order::{
    SpecCollegePlan, SpecTimePlan, detect_time_column, order_by_college, order_by_time,
    parse_datetime_text, plan_college_order, plan_time_order,
};
pub use pipeline::SheetOrderPipeline;
pub use report::ReportOrder;
pub use sheetorder_io_xlsx::{C_MIME_XLSX, SpecXlsxExportOptions};
pub use spec::{
    EnumOrderMode, SheetOrderError, SpecClassifyPolicy, SpecOrderRules, SpecPipelineOptions,
    SpecPipelineOutput, SpecTimeSortPolicy,
};
pub use util::{derive_column_names, preview_rows};
