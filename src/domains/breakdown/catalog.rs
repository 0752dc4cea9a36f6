use crate::domains::breakdown::types::{
    FlagCondition, MetricColumn, MetricSource, ReportPlan, ReportSpec, SentinelFlag,
};

/// Indicator groups of the care cascade, in cascade order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndicatorGroup {
    Linkage,
    BaselineCd4,
    AhdStaging,
    InitialViralLoad,
    RegimenChange,
    LatestViralLoad,
    Retention,
}

impl IndicatorGroup {
    pub const ALL: [IndicatorGroup; 7] = [
        IndicatorGroup::Linkage,
        IndicatorGroup::BaselineCd4,
        IndicatorGroup::AhdStaging,
        IndicatorGroup::InitialViralLoad,
        IndicatorGroup::RegimenChange,
        IndicatorGroup::LatestViralLoad,
        IndicatorGroup::Retention,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            IndicatorGroup::Linkage => "Linkage to ART",
            IndicatorGroup::BaselineCd4 => "Baseline CD4",
            IndicatorGroup::AhdStaging => "AHD & Staging",
            IndicatorGroup::InitialViralLoad => "Initial Viral Load",
            IndicatorGroup::RegimenChange => "Regimen Change",
            IndicatorGroup::LatestViralLoad => "Latest Viral Load",
            IndicatorGroup::Retention => "Retention",
        }
    }

    pub fn metrics(&self) -> Vec<MetricColumn> {
        use MetricSource::{CountRows, CountUnset, Sum};
        use SentinelFlag::*;

        match self {
            IndicatorGroup::Linkage => vec![
                MetricColumn::new("totalCases", "Total Cases", CountRows),
                MetricColumn::new("linked", "Linked", Sum(LinkedToArt)),
                MetricColumn::new("notLinked", "Not Linked", Sum(NotLinkedToArt)),
            ],
            IndicatorGroup::BaselineCd4 => vec![
                MetricColumn::new("withBaselineCd4", "Initial CD4 Done", Sum(WithBaselineCd4)),
                MetricColumn::new("withoutBaselineCd4", "Initial CD4 Not Done", Sum(WithoutBaselineCd4)),
            ],
            IndicatorGroup::AhdStaging => vec![
                MetricColumn::new("withAhd", "With AHD", Sum(Ahd)),
                MetricColumn::new("withoutAhd", "Without AHD", CountUnset(Ahd)),
                MetricColumn::new("notStaged", "Not Staged", Sum(NotStaged)),
            ],
            IndicatorGroup::InitialViralLoad => vec![
                MetricColumn::new("withInitialVl", "Initial VL Done", Sum(WithInitialViralLoad)),
                MetricColumn::new("withoutInitialVl", "Initial VL Not Done", Sum(WithoutInitialViralLoad)),
                MetricColumn::new("initialVlSuppressed", "Initial VL Suppressed", Sum(InitialViralLoadSuppressed)),
            ],
            IndicatorGroup::RegimenChange => vec![
                MetricColumn::new("regimenChanged", "Regimen Changed", Sum(RegimenChanged)),
                MetricColumn::new("regimenNotChanged", "Regimen Not Changed", Sum(RegimenNotChanged)),
            ],
            IndicatorGroup::LatestViralLoad => vec![
                MetricColumn::new("latestVlSuppressed", "Latest VL Suppressed", Sum(LatestViralLoadSuppressed)),
                MetricColumn::new("latestVlNotSuppressed", "Latest VL Unsuppressed", Sum(LatestViralLoadNotSuppressed)),
            ],
            IndicatorGroup::Retention => vec![
                MetricColumn::new("retained", "Retained", Sum(PatientRetained)),
                MetricColumn::new("notRetained", "Not Retained", Sum(PatientNotRetained)),
            ],
        }
    }

    /// This group and every later one
    pub fn onwards(self) -> impl Iterator<Item = IndicatorGroup> {
        IndicatorGroup::ALL.into_iter().filter(move |group| *group >= self)
    }
}

/// Nodes of the cascade diagram that have a dedicated breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeNode {
    TotalCasesReported,
    Linked,
    NotLinked,
    InitialCd4Done,
    InitialCd4NotDone,
    WithAhd,
    WithoutAhd,
    NotStaged,
    InitialViralLoadDone,
    InitialViralLoadNotDone,
    InitialViralLoadSuppressed,
    InitialViralLoadUnsuppressed,
    RegimenChangeDone,
    RegimenChangeNotDone,
    LatestViralLoadSuppressed,
    LatestViralLoadUnsuppressed,
    PatientsRetained,
    PatientsNotRetained,
}

impl CascadeNode {
    pub const ALL: [CascadeNode; 18] = [
        CascadeNode::TotalCasesReported,
        CascadeNode::Linked,
        CascadeNode::NotLinked,
        CascadeNode::InitialCd4Done,
        CascadeNode::InitialCd4NotDone,
        CascadeNode::WithAhd,
        CascadeNode::WithoutAhd,
        CascadeNode::NotStaged,
        CascadeNode::InitialViralLoadDone,
        CascadeNode::InitialViralLoadNotDone,
        CascadeNode::InitialViralLoadSuppressed,
        CascadeNode::InitialViralLoadUnsuppressed,
        CascadeNode::RegimenChangeDone,
        CascadeNode::RegimenChangeNotDone,
        CascadeNode::LatestViralLoadSuppressed,
        CascadeNode::LatestViralLoadUnsuppressed,
        CascadeNode::PatientsRetained,
        CascadeNode::PatientsNotRetained,
    ];

    /// Label as drawn on the diagram
    pub fn label(&self) -> &'static str {
        match self {
            CascadeNode::TotalCasesReported => "Total Cases Reported",
            CascadeNode::Linked => "Linked",
            CascadeNode::NotLinked => "Not Linked",
            CascadeNode::InitialCd4Done => "Initial CD4 Done",
            CascadeNode::InitialCd4NotDone => "Initial CD4 Not Done",
            CascadeNode::WithAhd => "With AHD",
            CascadeNode::WithoutAhd => "Without AHD",
            CascadeNode::NotStaged => "Not Staged",
            CascadeNode::InitialViralLoadDone => "Initial Viral Load Done",
            CascadeNode::InitialViralLoadNotDone => "Initial Viral Load Not Done",
            CascadeNode::InitialViralLoadSuppressed => "Initial Viral Load Suppressed",
            CascadeNode::InitialViralLoadUnsuppressed => "Initial Viral Load Unsuppressed",
            CascadeNode::RegimenChangeDone => "Regimen Change Done",
            CascadeNode::RegimenChangeNotDone => "Regimen Change Not Done",
            CascadeNode::LatestViralLoadSuppressed => "Latest Viral Load Suppressed",
            CascadeNode::LatestViralLoadUnsuppressed => "Latest Viral Load Unsuppressed",
            CascadeNode::PatientsRetained => "Patients Retained",
            CascadeNode::PatientsNotRetained => "Patients Not Retained",
        }
    }

    /// Exact match after trimming surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        CascadeNode::ALL.into_iter().find(|node| node.label() == label)
    }
}

/// Result of resolving a clicked label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelection {
    Cascade(CascadeNode),
    /// Chart chrome (legend, credits) rather than a cascade node
    ChartElement,
    Fallback(String),
}

impl NodeSelection {
    pub fn resolve(label: &str) -> Self {
        if label.contains("highcharts") {
            return NodeSelection::ChartElement;
        }
        match CascadeNode::from_label(label) {
            Some(node) => NodeSelection::Cascade(node),
            None => NodeSelection::Fallback(label.trim().to_string()),
        }
    }
}

pub const FALLBACK_TITLE: &str = "Cases Linked to ART by Gender";

fn linked_and(flags: &[FlagCondition]) -> Vec<FlagCondition> {
    let mut base = vec![SentinelFlag::LinkedToArt.is_set()];
    base.extend_from_slice(flags);
    base
}

fn group_reports(node: CascadeNode, first: IndicatorGroup) -> Vec<ReportSpec> {
    first
        .onwards()
        .map(|group| ReportSpec::by_gender(format!("{} - {}", node.label(), group.title()), group.metrics()))
        .collect()
}

fn single_number(title: &str, flag: SentinelFlag) -> Vec<ReportSpec> {
    vec![ReportSpec::by_gender(
        title,
        vec![MetricColumn::new("number", "Number", MetricSource::Sum(flag))],
    )]
}

/// Dispatch table from a resolved node to its reports
pub fn report_plan(selection: &NodeSelection) -> ReportPlan {
    use IndicatorGroup as G;
    use SentinelFlag as F;

    let node = match selection {
        NodeSelection::ChartElement => return ReportPlan::empty(),
        NodeSelection::Fallback(_) => {
            return ReportPlan {
                base: Vec::new(),
                reports: single_number(FALLBACK_TITLE, F::LinkedToArt),
            }
        }
        NodeSelection::Cascade(node) => *node,
    };

    let (base, reports) = match node {
        CascadeNode::TotalCasesReported => (Vec::new(), group_reports(node, G::Linkage)),
        CascadeNode::Linked => (linked_and(&[]), group_reports(node, G::BaselineCd4)),
        CascadeNode::NotLinked => (Vec::new(), single_number(node.label(), F::NotLinkedToArt)),
        CascadeNode::InitialCd4Done => (
            linked_and(&[F::WithBaselineCd4.is_set()]),
            group_reports(node, G::BaselineCd4),
        ),
        CascadeNode::InitialCd4NotDone => (
            linked_and(&[F::WithoutBaselineCd4.is_set()]),
            group_reports(node, G::BaselineCd4),
        ),
        CascadeNode::WithAhd => (
            linked_and(&[F::WithBaselineCd4.is_set(), F::Ahd.is_set()]),
            group_reports(node, G::AhdStaging),
        ),
        CascadeNode::WithoutAhd => (
            linked_and(&[F::WithBaselineCd4.is_set(), F::Ahd.is_unset()]),
            group_reports(node, G::AhdStaging),
        ),
        // Staging is recorded whether or not a baseline CD4 was taken
        CascadeNode::NotStaged => (
            linked_and(&[F::NotStaged.is_set()]),
            group_reports(node, G::AhdStaging),
        ),
        CascadeNode::InitialViralLoadDone => (
            linked_and(&[F::WithInitialViralLoad.is_set()]),
            group_reports(node, G::InitialViralLoad),
        ),
        CascadeNode::InitialViralLoadNotDone => (
            linked_and(&[F::WithoutInitialViralLoad.is_set()]),
            group_reports(node, G::InitialViralLoad),
        ),
        CascadeNode::InitialViralLoadSuppressed => (
            linked_and(&[F::InitialViralLoadSuppressed.is_set()]),
            group_reports(node, G::InitialViralLoad),
        ),
        CascadeNode::InitialViralLoadUnsuppressed => (
            linked_and(&[F::WithInitialViralLoad.is_set(), F::InitialViralLoadSuppressed.is_unset()]),
            group_reports(node, G::InitialViralLoad),
        ),
        CascadeNode::RegimenChangeDone => (
            linked_and(&[F::RegimenChanged.is_set()]),
            group_reports(node, G::RegimenChange),
        ),
        CascadeNode::RegimenChangeNotDone => (
            linked_and(&[F::RegimenNotChanged.is_set()]),
            group_reports(node, G::RegimenChange),
        ),
        CascadeNode::LatestViralLoadSuppressed => (
            linked_and(&[F::LatestViralLoadSuppressed.is_set()]),
            group_reports(node, G::Retention),
        ),
        CascadeNode::LatestViralLoadUnsuppressed => (
            linked_and(&[F::LatestViralLoadNotSuppressed.is_set()]),
            group_reports(node, G::Retention),
        ),
        CascadeNode::PatientsRetained => (
            linked_and(&[F::PatientRetained.is_set()]),
            single_number(node.label(), F::PatientRetained),
        ),
        CascadeNode::PatientsNotRetained => (
            linked_and(&[F::PatientNotRetained.is_set()]),
            single_number(node.label(), F::PatientNotRetained),
        ),
    };

    ReportPlan { base, reports }
}
