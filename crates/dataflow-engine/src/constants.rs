//! Column-name constants shared between the scheduler (which needs to
//! recognize the reconcile operator's output shape for the preview
//! difference-bias rule, §4.2) and the reconcile operator itself (which
//! produces them). Defined here, the one crate both the engine and
//! `dataflow-operators` can see.

pub const RECONCILE_DETAIL_SUM: &str = "明细汇总金额";
pub const RECONCILE_SUMMARY_SUM: &str = "汇总表金额";
pub const RECONCILE_DIFF: &str = "差额";
pub const RECONCILE_RESULT: &str = "核算结果";
pub const RECONCILE_RESULT_MATCH: &str = "✅ 一致";
pub const RECONCILE_RESULT_MISMATCH: &str = "❌ 不一致";

pub const DIFF_STATUS_COLUMN: &str = "_diff_status";
pub const DIFF_STATUS_LEFT_ONLY: &str = "仅在表1";
pub const DIFF_STATUS_RIGHT_ONLY: &str = "仅在表2";

pub const PROFIT_INCOME_TOTAL: &str = "一、收入";
pub const PROFIT_COST_TOTAL: &str = "二、成本";
pub const PROFIT_EXPENSE_TOTAL: &str = "三、费用";
pub const PROFIT_PROFIT_TOTAL: &str = "四、利润";

pub const PROFIT_GROUP_YEAR: &str = "年";
pub const PROFIT_GROUP_MONTH: &str = "月";
pub const PROFIT_GROUP_OFFICE: &str = "办公室";
