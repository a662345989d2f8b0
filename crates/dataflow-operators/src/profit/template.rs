//! The profit table's fixed column template, reproduced bit-for-bit from
//! the source workbook's header row.

pub const TEMPLATE_COLUMNS: &[&str] = &[
    "年份", "月份", "市场", "办公室", "店长姓名", "erp门店编号", "门店名称（自定义）", "开店时间", "关店时间", "erp门店名称",
    "是否店中店", "所属实体店门店名称", "人数",
    "一、收入", "计业绩产品收入", "不计业绩产品收入", "产品退货", "计业绩团品收入", "不计业绩团品收入", "旅游收入（非赠）", "其他收入",
    "二、成本", "计业绩产品成本", "计业绩产品赠品（主品）", "不计业绩产品成本", "成本优惠", "退货成本", "计业绩团品成本", "不计业绩团品成本",
    "旅游成本（非赠）", "其他成本",
    "三、费用", "一线工资", "高管工资", "二线工资（人事司机）", "一线社保", "高管社保", "二线社保（人事司机）",
    "主品赠送（非主品）", "小单礼品", "绑定上人礼品", "分享会礼品", "维护客户礼品",
    "业务办公费", "旅游", "任务款", "红包", "门店押金", "门店转让费、中介费", "门店房租", "门店装修", "门店资产", "门店暖气费",
    "门店物业费", "门店水、电、液化气", "公司服务费", "代账费", "运费",
    "利息收支、手续费（转账）", "直播间APP手续费（0.6%）", "辅酶手续费（千分之6）", "富友手续费（千分之2.2）",
    "门店税费", "企微年费分摊", "直播流量费分摊", "仓储运费分摊", "其他分摊", "其他费用",
    "四、利润",
    "一代管道", "二代管道", "三代管道", "四代管道", "五代管道", "六代管道", "股东1", "股东2",
    "一代经理级别", "一代提成比例", "一代提成金额",
    "二代经理级别", "二代提成比例", "二代提成金额",
    "三代经理级别", "三代提成比例", "三代提成金额",
    "一级经理姓名", "一级经理提成比例", "一级经理提成金额",
    "特殊一级经理姓名", "特殊一级经理提成比例", "特殊一级经理提成金额",
    "特特殊一级经理姓名", "特特殊一级经理提成比例", "特特殊一级经理提成金额",
    "股东1姓名", "股东1提成比例", "股东1提成金额", "股东2姓名", "股东2提成比例", "股东2提成金额", "品牌、软件公司",
];
