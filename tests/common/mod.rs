#![allow(dead_code)]

use portfolio_audit::ProjectDocument;

pub const NS: &str = "http://schemas.microsoft.com/project";

/// Builds minimal MSPDI exports for tests.
#[derive(Default, Clone)]
pub struct ProjectXml {
    pub owners: Vec<String>,
    pub baselines: usize,
    pub bcws: Option<String>,
    pub bcwp: Option<String>,
    pub acwp: Option<String>,
    pub percent_complete: Option<String>,
    pub tasks: Vec<String>,
}

impl ProjectXml {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.owners.push(owner.to_string());
        self
    }

    pub fn baselines(mut self, count: usize) -> Self {
        self.baselines = count;
        self
    }

    pub fn evm(mut self, pv: f64, ev: f64, ac: f64, pct: f64) -> Self {
        self.bcws = Some(pv.to_string());
        self.bcwp = Some(ev.to_string());
        self.acwp = Some(ac.to_string());
        self.percent_complete = Some(pct.to_string());
        self
    }

    /// Adds a leaf task with the given hour estimates for Duration1,
    /// Duration and Duration2.
    pub fn task(self, name: &str, optimistic_h: u32, likely_h: u32, pessimistic_h: u32) -> Self {
        self.raw_task(&format!(
            "<Name>{name}</Name><Summary>0</Summary>\
             <Duration1>PT{optimistic_h}H0M0S</Duration1>\
             <Duration>PT{likely_h}H0M0S</Duration>\
             <Duration2>PT{pessimistic_h}H0M0S</Duration2>\
             <Cost>100</Cost>"
        ))
    }

    pub fn summary_task(self, name: &str) -> Self {
        self.raw_task(&format!(
            "<Name>{name}</Name><Summary>1</Summary><Duration>PT80H0M0S</Duration>"
        ))
    }

    pub fn raw_task(mut self, inner: &str) -> Self {
        self.tasks.push(format!("<Task>{inner}</Task>"));
        self
    }

    pub fn build(&self) -> String {
        let mut xml = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Project xmlns=\"{NS}\">");
        xml.push_str("<Name>Fixture</Name>");
        for (tag, value) in [
            ("BCWS", &self.bcws),
            ("BCWP", &self.bcwp),
            ("ACWP", &self.acwp),
            ("PercentComplete", &self.percent_complete),
        ] {
            if let Some(value) = value {
                xml.push_str(&format!("<{tag}>{value}</{tag}>"));
            }
        }
        xml.push_str("<Tasks>");
        for task in &self.tasks {
            xml.push_str(task);
        }
        xml.push_str("</Tasks>");
        xml.push_str("<Assignments>");
        for (idx, owner) in self.owners.iter().enumerate() {
            xml.push_str(&format!(
                "<Assignment><UID>{idx}</UID><AssnOwner>{owner}</AssnOwner>"
            ));
            if idx == 0 {
                for number in 0..self.baselines {
                    xml.push_str(&format!("<Baseline><Number>{number}</Number></Baseline>"));
                }
            }
            xml.push_str("</Assignment>");
        }
        if self.owners.is_empty() {
            for number in 0..self.baselines {
                xml.push_str(&format!("<Baseline><Number>{number}</Number></Baseline>"));
            }
        }
        xml.push_str("</Assignments>");
        xml.push_str("</Project>");
        xml
    }

    pub fn document(&self, name: &str) -> ProjectDocument {
        ProjectDocument::from_upload(name, self.build())
    }
}

/// Five well-formed tasks with distinct estimates.
pub fn healthy_tasks(xml: ProjectXml) -> ProjectXml {
    (1..=5).fold(xml, |xml, i| xml.task(&format!("Task {i}"), 8 * i, 16 * i, 24 * i))
}
