//! Manually entered employee data, used in place of OCR'd documents.
//!
//! Each record types the fields the analysis flow reads and carries any other
//! columns through untouched in `extra`.

use serde::{Deserialize, Serialize};

type Extra = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayslipRecord {
    /// Pay period, `YYYY-MM`.
    pub month: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_worked: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overtime_hours: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_worked: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_salary: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One employee's manually entered payslips, attendance and contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub employee_id: String,
    #[serde(default)]
    pub payslips: Vec<PayslipRecord>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub contract: ContractRecord,
}

impl ManualEntry {
    /// Enough data to submit: an employee id and at least one payslip.
    pub fn is_submittable(&self) -> bool {
        !self.employee_id.trim().is_empty() && !self.payslips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_columns_are_preserved() {
        let json = r#"{
            "employee_id": "E-17",
            "payslips": [{"month": "2025-01", "gross_salary": 6200.0, "pension": 372.0}],
            "attendance": [{"date": "2025-01-02", "hours_worked": 9.5}],
            "contract": {"hourly_rate": 38.5, "union": "none"}
        }"#;
        let entry: ManualEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.payslips[0].extra["pension"], 372.0);
        assert_eq!(entry.contract.extra["union"], "none");

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["payslips"][0]["pension"], 372.0);
        assert!(back["payslips"][0].get("net_salary").is_none());
    }

    #[test]
    fn submittable_requires_employee_and_payslip() {
        let mut entry = ManualEntry {
            employee_id: "E-17".into(),
            ..Default::default()
        };
        assert!(!entry.is_submittable());
        entry.payslips.push(PayslipRecord {
            month: "2025-01".into(),
            ..Default::default()
        });
        assert!(entry.is_submittable());
        entry.employee_id = "  ".into();
        assert!(!entry.is_submittable());
    }
}
