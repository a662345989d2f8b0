//! `profit_table`: reads the eleven source sheets out of one workbook
//! (订单明细/直播间/退货/资金日报/分摊费用/工资表/财务系统/富友流水/
//! 刘洋房租/胡兴旺房租/市场定额) and fills as many of the fixed template
//! columns as the source sheets support, leaving the rest absent.

use crate::profit::template::TEMPLATE_COLUMNS;
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::io::xlsx::{read_xlsx, SheetRef};
use dataflow_table::{AggFunc, Column, Table, Value};
use regex::Regex;
use serde_json::Value as Json;
use std::collections::{HashMap, HashSet};

fn read_sheet(path: &std::path::Path, name: &str, row_limit: Option<usize>) -> Table {
    read_xlsx(path, &SheetRef::Name(name.to_string()), 1, 0, row_limit).unwrap_or_else(|_| Table::empty())
}

fn normalize_store_name(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("none") {
        return String::new();
    }
    let prefix = Regex::new(r"^（[^）]+）|^\([^)]*\)").expect("static pattern");
    prefix.replace(s, "").trim().to_string()
}

fn col_text(table: &Table, row: usize, name: &str) -> String {
    table.column(name).map(|c| c.values[row].display_text()).unwrap_or_default()
}

fn col_num(table: &Table, row: usize, name: &str) -> f64 {
    table.column(name).and_then(|c| c.values[row].as_f64()).unwrap_or(0.0)
}

/// Sums `amount_col` grouped by `store_col` for rows where `mask(row)`
/// holds.
fn masked_sum_by_store(table: &Table, store_col: &str, amount_col: &str, mask: impl Fn(usize) -> bool) -> HashMap<String, f64> {
    let mut out: HashMap<String, f64> = HashMap::new();
    if table.num_rows() == 0 || !table.has_column(store_col) || !table.has_column(amount_col) {
        return out;
    }
    for r in 0..table.num_rows() {
        if !mask(r) {
            continue;
        }
        let store = col_text(table, r, store_col);
        if store.is_empty() {
            continue;
        }
        *out.entry(store).or_insert(0.0) += col_num(table, r, amount_col);
    }
    out
}

fn filter_team(table: Table, team_col: &str, team_name: &str) -> Table {
    if team_name.is_empty() || !table.has_column(team_col) {
        return table;
    }
    let idx = table.column_index(team_col).unwrap();
    let keep: Vec<bool> = table.columns()[idx].values.iter().map(|v| v.display_text() == team_name).collect();
    table.filter_indices(&keep)
}

fn filter_year_month(table: Table, date_col: &str, year: i64, month: i64) -> Table {
    if !table.has_column(date_col) {
        return Table::empty();
    }
    let idx = table.column_index(date_col).unwrap();
    let keep: Vec<bool> = table.columns()[idx]
        .values
        .iter()
        .map(|v| crate::profit::common::year_month(v) == Some((year, month)))
        .collect();
    table.filter_indices(&keep)
}

fn with_store_column(table: Table, source_col: &str) -> Table {
    if !table.has_column(source_col) {
        return table;
    }
    let idx = table.column_index(source_col).unwrap();
    let stores: Vec<Value> = table.columns()[idx].values.iter().map(|v| Value::Text(normalize_store_name(&v.display_text()))).collect();
    let mut table = table;
    table.push_column(Column::new("_store", stores));
    table
}

fn infer_team_name(candidates: &[(&Table, &str)]) -> String {
    for (table, col) in candidates {
        if table.num_rows() == 0 || !table.has_column(col) {
            continue;
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        let idx = table.column_index(col).unwrap();
        for v in &table.columns()[idx].values {
            let s = v.display_text().trim().to_string();
            if !s.is_empty() {
                *counts.entry(s).or_insert(0) += 1;
            }
        }
        if let Some((name, _)) = counts.into_iter().max_by_key(|(_, n)| *n) {
            return name;
        }
    }
    String::new()
}

fn infer_year_month(candidates: &[(&Table, &str)]) -> Option<(i64, i64)> {
    for (table, col) in candidates {
        if table.num_rows() == 0 || !table.has_column(col) {
            continue;
        }
        let idx = table.column_index(col).unwrap();
        let mut counts: HashMap<(i64, i64), usize> = HashMap::new();
        for v in &table.columns()[idx].values {
            if let Some(ym) = crate::profit::common::year_month(v) {
                *counts.entry(ym).or_insert(0) += 1;
            }
        }
        if let Some((ym, _)) = counts.into_iter().max_by_key(|(_, n)| *n) {
            return Some(ym);
        }
    }
    None
}

pub fn run(_inputs: Vec<Table>, config: &Json, ctx: &mut OperatorContext) -> Result<Table> {
    let file_id = crate::config::require_str(config, "file_id")?;
    let path = ctx
        .file_registry
        .resolve(file_id, ctx.caller_identity)
        .ok_or_else(|| DataflowError::file_not_found(file_id))?;
    let row_limit = if ctx.preview { ctx.source_row_limit } else { None };

    let orders = read_sheet(&path, "订单明细", row_limit);
    let live = read_sheet(&path, "直播间", row_limit);
    let returns = read_sheet(&path, "退货", row_limit);
    let funds = read_sheet(&path, "资金日报", row_limit);
    let alloc = read_sheet(&path, "分摊费用", row_limit);
    let payroll = read_sheet(&path, "工资表", row_limit);
    let finance = read_sheet(&path, "财务系统", row_limit);
    let fuiou = read_sheet(&path, "富友流水", row_limit);
    let rent_liu = read_sheet(&path, "刘洋房租", row_limit);
    let rent_hu = read_sheet(&path, "胡兴旺房租", row_limit);
    let quota = read_sheet(&path, "市场定额", row_limit);

    let team_name = crate::config::opt_str(config, "team_name")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            infer_team_name(&[
                (&orders, "所属团队"),
                (&live, "所属团队"),
                (&returns, "团队"),
                (&funds, "团队"),
                (&finance, "市场团队"),
            ])
        });

    let market_name = crate::config::opt_str(config, "market_name").filter(|s| !s.is_empty()).map(str::to_string).unwrap_or_else(|| {
        if team_name.is_empty() {
            String::new()
        } else {
            team_name.chars().take(2).collect()
        }
    });
    let office_name = crate::config::opt_str(config, "office_name").filter(|s| !s.is_empty()).map(str::to_string).unwrap_or_else(|| {
        if !market_name.is_empty() && team_name.starts_with(&market_name) {
            team_name.chars().skip(market_name.chars().count()).collect()
        } else {
            team_name.clone()
        }
    });

    let cfg_year = crate::config::opt_u64(config, "year", 0) as i64;
    let cfg_month = crate::config::opt_u64(config, "month", 0) as i64;
    let (year, month) = if cfg_year > 0 && cfg_month > 0 {
        (cfg_year, cfg_month)
    } else {
        infer_year_month(&[
            (&orders, "订单提交时间"),
            (&live, "订单提交时间"),
            (&funds, "日期"),
            (&returns, "订单时间"),
            (&returns, "申请时间"),
        ])
        .ok_or_else(|| DataflowError::internal("无法推断年份/月份：请在配置中填写 year/month 或确保来源表含日期列"))?
    };

    let orders_f = if team_name.is_empty() { orders } else { filter_team(orders, "所属团队", &team_name) };
    let orders_f = filter_year_month(orders_f, "订单提交时间", year, month);
    let orders_f = with_store_column(orders_f, "所属门店");

    let mut store_id_map: HashMap<String, i64> = HashMap::new();
    if quota.has_column("店面") && quota.has_column("店面编号") {
        for r in 0..quota.num_rows() {
            let store = normalize_store_name(&col_text(&quota, r, "店面"));
            let id = col_num(&quota, r, "店面编号");
            if !store.is_empty() && id != 0.0 {
                store_id_map.insert(store, id as i64);
            }
        }
    }

    let mut stores: Vec<String> = if orders_f.has_column("_store") {
        let idx = orders_f.column_index("_store").unwrap();
        let set: HashSet<String> = orders_f.columns()[idx].values.iter().map(|v| v.display_text()).filter(|s| !s.is_empty()).collect();
        let mut v: Vec<String> = set.into_iter().collect();
        v.sort();
        v
    } else {
        Vec::new()
    };
    if stores.is_empty() && payroll.has_column("门店名称") {
        let idx = payroll.column_index("门店名称").unwrap();
        let set: HashSet<String> = payroll.columns()[idx]
            .values
            .iter()
            .map(|v| normalize_store_name(&v.display_text()))
            .filter(|s| !s.is_empty())
            .collect();
        let mut v: Vec<String> = set.into_iter().collect();
        v.sort();
        stores = v;
    }
    if stores.is_empty() {
        let columns = TEMPLATE_COLUMNS.iter().map(|c| Column::new(c.to_string(), Vec::new())).collect();
        return Ok(Table::from_columns(columns));
    }

    let is = |table: &Table, row: usize, col: &str, want: &str| col_text(table, row, col) == want;

    let rev_main_perf = masked_sum_by_store(&orders_f, "_store", "订单实际支付", |r| is(&orders_f, r, "商品类型", "主品") && is(&orders_f, r, "是否计入业绩", "计入业绩"));
    let rev_main_nonperf = masked_sum_by_store(&orders_f, "_store", "订单实际支付", |r| is(&orders_f, r, "商品类型", "主品") && is(&orders_f, r, "是否计入业绩", "不计入业绩"));
    let mut rev_group_perf = masked_sum_by_store(&orders_f, "_store", "订单实际支付", |r| is(&orders_f, r, "商品类型", "团品") && is(&orders_f, r, "是否计入业绩", "计入业绩"));
    let mut rev_group_nonperf = masked_sum_by_store(&orders_f, "_store", "订单实际支付", |r| is(&orders_f, r, "商品类型", "团品") && is(&orders_f, r, "是否计入业绩", "不计入业绩"));

    let cost_main_perf = masked_sum_by_store(&orders_f, "_store", "成本合计", |r| {
        is(&orders_f, r, "商品类型", "主品") && is(&orders_f, r, "是否计入业绩", "计入业绩") && is(&orders_f, r, "是否赠品", "非赠品")
    });
    let cost_main_gift = masked_sum_by_store(&orders_f, "_store", "成本合计", |r| {
        is(&orders_f, r, "商品类型", "主品") && is(&orders_f, r, "是否计入业绩", "计入业绩") && !is(&orders_f, r, "是否赠品", "非赠品")
    });
    let cost_main_nonperf = masked_sum_by_store(&orders_f, "_store", "成本合计", |r| {
        is(&orders_f, r, "商品类型", "主品") && is(&orders_f, r, "是否计入业绩", "不计入业绩") && is(&orders_f, r, "是否赠品", "非赠品")
    });
    let mut cost_group_perf = masked_sum_by_store(&orders_f, "_store", "成本合计", |r| is(&orders_f, r, "商品类型", "团品") && is(&orders_f, r, "是否计入业绩", "计入业绩"));
    let mut cost_group_nonperf = masked_sum_by_store(&orders_f, "_store", "成本合计", |r| is(&orders_f, r, "商品类型", "团品") && is(&orders_f, r, "是否计入业绩", "不计入业绩"));

    let live_f = if team_name.is_empty() { live } else { filter_team(live, "所属团队", &team_name) };
    let live_f = filter_year_month(live_f, "订单提交时间", year, month);
    let live_f = with_store_column(live_f, "所属门店");
    let live_rev_perf = masked_sum_by_store(&live_f, "_store", "实际支付金额", |r| is(&live_f, r, "是否计入业绩", "计入业绩"));
    let live_rev_nonperf = masked_sum_by_store(&live_f, "_store", "实际支付金额", |r| is(&live_f, r, "是否计入业绩", "不计入业绩"));
    let live_cost_perf = masked_sum_by_store(&live_f, "_store", "成本合计", |r| is(&live_f, r, "是否计入业绩", "计入业绩"));
    let live_cost_nonperf = masked_sum_by_store(&live_f, "_store", "成本合计", |r| is(&live_f, r, "是否计入业绩", "不计入业绩"));
    for (k, v) in live_rev_perf {
        *rev_group_perf.entry(k).or_insert(0.0) += v;
    }
    for (k, v) in live_rev_nonperf {
        *rev_group_nonperf.entry(k).or_insert(0.0) += v;
    }
    for (k, v) in live_cost_perf {
        *cost_group_perf.entry(k).or_insert(0.0) += v;
    }
    for (k, v) in live_cost_nonperf {
        *cost_group_nonperf.entry(k).or_insert(0.0) += v;
    }

    let returns_f = if team_name.is_empty() { returns } else { filter_team(returns, "团队", &team_name) };
    let returns_f = if returns_f.has_column("订单时间") {
        filter_year_month(returns_f, "订单时间", year, month)
    } else if returns_f.has_column("申请时间") {
        filter_year_month(returns_f, "申请时间", year, month)
    } else {
        returns_f
    };
    let returns_f = with_store_column(returns_f, "门店");
    let ret_amt_main = masked_sum_by_store(&returns_f, "_store", "总退货金额", |r| is(&returns_f, r, "是否团品", "主品"));
    let ret_cost_all = masked_sum_by_store(&returns_f, "_store", "成本合计", |_| true);

    let ym_int = year * 100 + month;
    let payroll_f = {
        let mut t = payroll;
        if t.has_column("市场名称") && (!team_name.is_empty() || !office_name.is_empty()) {
            let key = if !team_name.is_empty() { &team_name } else { &office_name };
            let idx = t.column_index("市场名称").unwrap();
            let keep: Vec<bool> = t.columns()[idx].values.iter().map(|v| v.display_text().contains(key.as_str())).collect();
            t = t.filter_indices(&keep);
        }
        if t.has_column("年月") {
            let idx = t.column_index("年月").unwrap();
            let keep: Vec<bool> = t.columns()[idx].values.iter().map(|v| v.as_f64().map(|n| n as i64) == Some(ym_int)).collect();
            t = t.filter_indices(&keep);
        }
        with_store_column(t, "门店名称")
    };
    let salary = masked_sum_by_store(&payroll_f, "_store", "税前工资", |_| true);

    let finance_f = {
        let mut t = finance;
        if t.has_column("市场团队") && !team_name.is_empty() {
            let idx = t.column_index("市场团队").unwrap();
            let keep: Vec<bool> = t.columns()[idx].values.iter().map(|v| v.display_text() == team_name).collect();
            t = t.filter_indices(&keep);
        }
        if t.has_column("月份") {
            let idx = t.column_index("月份").unwrap();
            let keep: Vec<bool> = t.columns()[idx].values.iter().map(|v| v.as_f64().map(|n| n as i64) == Some(ym_int)).collect();
            t = t.filter_indices(&keep);
        }
        with_store_column(t, "门店名称")
    };
    let task = masked_sum_by_store(&finance_f, "_store", "任务款", |_| true);

    let fuiou_f = {
        let t = if fuiou.has_column("交易日期") { filter_year_month(fuiou, "交易日期", year, month) } else { fuiou };
        with_store_column(t, "门店名称")
    };
    let fuiou_fee = masked_sum_by_store(&fuiou_f, "_store", "订单手续费", |_| true);

    let funds_f = {
        let mut t = if team_name.is_empty() { funds } else { filter_team(funds, "团队", &team_name) };
        if t.has_column("日期") {
            t = filter_year_month(t, "日期", year, month);
        }
        with_store_column(t, "店面名称")
    };
    let funds_amount_col: Option<&str> = ["减少", "（市场报销）", "增加"].into_iter().find(|&c| funds_f.has_column(c));
    let (social_security_1, social_security_exec, utilities): (HashMap<String, f64>, HashMap<String, f64>, HashMap<String, f64>) =
        match (funds_amount_col, funds_f.has_column("科目")) {
            (Some(amount_col), true) if funds_f.num_rows() > 0 => {
                let pivot = funds_f.pivot(&["_store".to_string()], "科目", amount_col, AggFunc::Sum).unwrap_or_else(|_| Table::empty());
                let extract = |subject: &str| -> HashMap<String, f64> {
                    if !pivot.has_column(subject) {
                        return HashMap::new();
                    }
                    let store_idx = pivot.column_index("_store").unwrap();
                    let val_idx = pivot.column_index(subject).unwrap();
                    (0..pivot.num_rows())
                        .map(|r| (pivot.columns()[store_idx].values[r].display_text(), pivot.columns()[val_idx].values[r].as_f64().unwrap_or(0.0)))
                        .collect()
                };
                (extract("一线社保"), extract("高管社保"), extract("门店水、电、液化气"))
            }
            _ => (HashMap::new(), HashMap::new(), HashMap::new()),
        };

    let rent_series = |df: Table| -> (HashMap<String, f64>, HashMap<String, String>) {
        if df.num_rows() == 0 || !df.has_column("店面名称") {
            return (HashMap::new(), HashMap::new());
        }
        let prefer = [format!("{}月摊销", month), format!("{}月摊", month), "本月下费用".to_string()];
        let Some(val_col) = prefer.iter().map(String::as_str).find(|c| df.has_column(c)) else {
            return (HashMap::new(), HashMap::new());
        };
        let df = with_store_column(df, "店面名称");
        let sums = masked_sum_by_store(&df, "_store", val_col, |_| true);
        let mut managers = HashMap::new();
        if df.has_column("店长") {
            let store_idx = df.column_index("_store").unwrap();
            let mgr_idx = df.column_index("店长").unwrap();
            for r in 0..df.num_rows() {
                let store = df.columns()[store_idx].values[r].display_text();
                if store.is_empty() || managers.contains_key(&store) {
                    continue;
                }
                let mgr = df.columns()[mgr_idx].values[r].display_text();
                if !mgr.trim().is_empty() {
                    managers.insert(store, mgr.trim().to_string());
                }
            }
        }
        (sums, managers)
    };
    let (rent_liu_sums, manager_liu) = rent_series(rent_liu);
    let (rent_hu_sums, manager_hu) = rent_series(rent_hu);
    let inter_liu = rent_liu_sums.keys().filter(|&k| stores.contains(k)).count();
    let inter_hu = rent_hu_sums.keys().filter(|&k| stores.contains(k)).count();
    let (rent_sums, manager_map) = if inter_liu >= inter_hu { (rent_liu_sums, manager_liu) } else { (rent_hu_sums, manager_hu) };

    let alloc_f = {
        let mut t = alloc;
        let team_col = if t.has_column("团队.1") { Some("团队.1") } else if t.has_column("团队") { Some("团队") } else { None };
        if let Some(team_col) = team_col {
            let key = if !office_name.is_empty() { &office_name } else { &team_name };
            if !key.is_empty() {
                let idx = t.column_index(team_col).unwrap();
                let keep: Vec<bool> = t.columns()[idx].values.iter().map(|v| v.display_text().contains(key.as_str())).collect();
                t = t.filter_indices(&keep);
            }
        }
        with_store_column(t, "门店")
    };
    let tax = masked_sum_by_store(&alloc_f, "_store", "门店税费", |_| true);
    let qiye = masked_sum_by_store(&alloc_f, "_store", "企信分摊金额", |_| true);
    let daizhang_col = format!("{}月下费用", month);
    let daizhang = masked_sum_by_store(&alloc_f, "_store", &daizhang_col, |_| true);

    let mut columns: HashMap<&str, Vec<Value>> = TEMPLATE_COLUMNS.iter().map(|c| (*c, Vec::with_capacity(stores.len()))).collect();
    let get = |m: &HashMap<String, f64>, st: &str| *m.get(st).unwrap_or(&0.0);

    for st in &stores {
        let rev_main_perf_v = get(&rev_main_perf, st);
        let rev_main_nonperf_v = get(&rev_main_nonperf, st);
        let product_return_v = -get(&ret_amt_main, st);
        let rev_group_perf_v = get(&rev_group_perf, st);
        let rev_group_nonperf_v = get(&rev_group_nonperf, st);
        let income_total = rev_main_perf_v + rev_main_nonperf_v + product_return_v + rev_group_perf_v + rev_group_nonperf_v;

        let cost_main_perf_v = get(&cost_main_perf, st);
        let cost_main_gift_v = get(&cost_main_gift, st);
        let cost_main_nonperf_v = get(&cost_main_nonperf, st);
        let return_cost_v = -get(&ret_cost_all, st);
        let cost_group_perf_v = get(&cost_group_perf, st);
        let cost_group_nonperf_v = get(&cost_group_nonperf, st);
        let cost_total = cost_main_perf_v + cost_main_gift_v + cost_main_nonperf_v + return_cost_v + cost_group_perf_v + cost_group_nonperf_v;

        let salary_v = get(&salary, st);
        let social1_v = get(&social_security_1, st);
        let social_exec_v = get(&social_security_exec, st);
        let utilities_v = get(&utilities, st);
        let task_v = get(&task, st);
        let rent_v = get(&rent_sums, st);
        let daizhang_v = get(&daizhang, st);
        let tax_v = get(&tax, st);
        let qiye_v = get(&qiye, st);
        let fuiou_fee_v = get(&fuiou_fee, st);
        let expense_total = salary_v + social1_v + social_exec_v + utilities_v + task_v + rent_v + daizhang_v + tax_v + qiye_v + fuiou_fee_v;

        let profit_total = income_total - cost_total - expense_total;

        let mut row: HashMap<&str, Value> = HashMap::new();
        row.insert("年份", Value::Integer(year));
        row.insert("月份", Value::Integer(month));
        row.insert("市场", Value::Text(market_name.clone()));
        row.insert("办公室", Value::Text(office_name.clone()));
        row.insert("所属实体店门店名称", Value::Text(st.clone()));
        row.insert("erp门店名称", Value::Text(st.clone()));
        row.insert("门店名称（自定义）", Value::Text(st.clone()));
        if let Some(id) = store_id_map.get(st) {
            row.insert("erp门店编号", Value::Integer(*id));
        }
        if let Some(mgr) = manager_map.get(st) {
            row.insert("店长姓名", Value::Text(mgr.clone()));
        }
        row.insert("计业绩产品收入", Value::Real(rev_main_perf_v));
        row.insert("不计业绩产品收入", Value::Real(rev_main_nonperf_v));
        row.insert("产品退货", Value::Real(product_return_v));
        row.insert("计业绩团品收入", Value::Real(rev_group_perf_v));
        row.insert("不计业绩团品收入", Value::Real(rev_group_nonperf_v));
        row.insert("一、收入", Value::Real(income_total));
        row.insert("计业绩产品成本", Value::Real(cost_main_perf_v));
        row.insert("计业绩产品赠品（主品）", Value::Real(cost_main_gift_v));
        row.insert("不计业绩产品成本", Value::Real(cost_main_nonperf_v));
        row.insert("退货成本", Value::Real(return_cost_v));
        row.insert("计业绩团品成本", Value::Real(cost_group_perf_v));
        row.insert("不计业绩团品成本", Value::Real(cost_group_nonperf_v));
        row.insert("二、成本", Value::Real(cost_total));
        row.insert("一线工资", Value::Real(salary_v));
        row.insert("一线社保", Value::Real(social1_v));
        row.insert("高管社保", Value::Real(social_exec_v));
        row.insert("门店水、电、液化气", Value::Real(utilities_v));
        row.insert("任务款", Value::Real(task_v));
        row.insert("门店房租", Value::Real(rent_v));
        row.insert("代账费", Value::Real(daizhang_v));
        row.insert("门店税费", Value::Real(tax_v));
        row.insert("企微年费分摊", Value::Real(qiye_v));
        row.insert("富友手续费（千分之2.2）", Value::Real(fuiou_fee_v));
        row.insert("三、费用", Value::Real(expense_total));
        row.insert("四、利润", Value::Real(profit_total));

        for name in TEMPLATE_COLUMNS {
            let value = row.remove(name).unwrap_or(Value::Absent);
            columns.get_mut(name).expect("template column").push(value);
        }
    }

    let ordered: Vec<Column> = TEMPLATE_COLUMNS
        .iter()
        .map(|name| Column::new(name.to_string(), columns.remove(name).unwrap_or_default()))
        .collect();
    Ok(Table::from_columns(ordered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_store_name_strips_half_and_full_width_prefixes() {
        assert_eq!(normalize_store_name("(分公司)朝阳店"), "朝阳店");
        assert_eq!(normalize_store_name("（分公司）朝阳店"), "朝阳店");
        assert_eq!(normalize_store_name("朝阳店"), "朝阳店");
    }

    #[test]
    fn normalize_store_name_blanks_nan_and_none_and_whitespace() {
        assert_eq!(normalize_store_name("nan"), "");
        assert_eq!(normalize_store_name("NaN"), "");
        assert_eq!(normalize_store_name("none"), "");
        assert_eq!(normalize_store_name("   "), "");
    }

    #[test]
    fn masked_sum_by_store_sums_only_masked_rows_grouped_by_store() {
        let table = Table::from_columns(vec![
            Column::new("_store", vec![Value::Text("A".into()), Value::Text("A".into()), Value::Text("B".into())]),
            Column::new("amt", vec![Value::Real(10.0), Value::Real(5.0), Value::Real(100.0)]),
        ]);
        let sums = masked_sum_by_store(&table, "_store", "amt", |r| r != 2);
        assert_eq!(sums.get("A"), Some(&15.0));
        assert_eq!(sums.get("B"), None);
    }

    #[test]
    fn masked_sum_by_store_skips_rows_with_blank_store() {
        let table = Table::from_columns(vec![
            Column::new("_store", vec![Value::Text("".into()), Value::Text("A".into())]),
            Column::new("amt", vec![Value::Real(10.0), Value::Real(5.0)]),
        ]);
        let sums = masked_sum_by_store(&table, "_store", "amt", |_| true);
        assert_eq!(sums.len(), 1);
        assert_eq!(sums.get("A"), Some(&5.0));
    }

    #[test]
    fn masked_sum_by_store_is_empty_when_columns_are_missing() {
        let table = Table::from_columns(vec![Column::new("x", vec![Value::Integer(1)])]);
        assert!(masked_sum_by_store(&table, "_store", "amt", |_| true).is_empty());
    }

    #[test]
    fn infer_team_name_picks_the_majority_value_from_the_first_usable_candidate() {
        let empty = Table::empty();
        let orders = Table::from_columns(vec![Column::new(
            "所属团队",
            vec![Value::Text("刘洋团队".into()), Value::Text("刘洋团队".into()), Value::Text("胡兴旺团队".into())],
        )]);
        let name = infer_team_name(&[(&empty, "所属团队"), (&orders, "所属团队")]);
        assert_eq!(name, "刘洋团队");
    }

    #[test]
    fn infer_team_name_is_empty_when_no_candidate_has_the_column() {
        let empty = Table::empty();
        assert_eq!(infer_team_name(&[(&empty, "所属团队")]), "");
    }

    #[test]
    fn infer_year_month_picks_the_majority_period() {
        let ts_july = dataflow_table::dates::parse_timestamp("2026-07-15").unwrap();
        let ts_june = dataflow_table::dates::parse_timestamp("2026-06-01").unwrap();
        let orders = Table::from_columns(vec![Column::new(
            "订单提交时间",
            vec![Value::Timestamp(ts_july), Value::Timestamp(ts_july), Value::Timestamp(ts_june)],
        )]);
        assert_eq!(infer_year_month(&[(&orders, "订单提交时间")]), Some((2026, 7)));
    }

    #[test]
    fn infer_year_month_falls_through_to_the_next_candidate_when_first_is_absent() {
        let empty = Table::empty();
        let ts = dataflow_table::dates::parse_timestamp("2026-05-01").unwrap();
        let funds = Table::from_columns(vec![Column::new("日期", vec![Value::Timestamp(ts)])]);
        assert_eq!(infer_year_month(&[(&empty, "订单提交时间"), (&funds, "日期")]), Some((2026, 5)));
    }

    #[test]
    fn rent_sheet_tie_break_prefers_the_first_candidate_on_equal_store_overlap() {
        let stores = vec!["A".to_string(), "B".to_string()];
        let rent_liu: HashMap<String, f64> = [("A".to_string(), 1.0), ("B".to_string(), 2.0)].into_iter().collect();
        let rent_hu: HashMap<String, f64> = [("A".to_string(), 9.0), ("B".to_string(), 9.0)].into_iter().collect();
        let inter_liu = rent_liu.keys().filter(|k| stores.contains(k)).count();
        let inter_hu = rent_hu.keys().filter(|k| stores.contains(k)).count();
        let (chosen, _) = if inter_liu >= inter_hu { (&rent_liu, "liu") } else { (&rent_hu, "hu") };
        assert_eq!(chosen.get("A"), Some(&1.0));
    }
}
