use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::db_migration;

/// Single-connection in-memory database with no tables.
pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool")
}

/// In-memory database with both tables created and the fixture rows loaded.
pub async fn seeded_pool() -> SqlitePool {
    let pool = memory_pool().await;
    db_migration::initialize_database(&pool).await.expect("migrations");

    for flow in flow_fixtures() {
        insert_flow(&pool, &flow).await;
    }
    for event in event_fixtures() {
        insert_event(&pool, &event).await;
    }
    pool
}

#[derive(Debug, Clone)]
pub struct FlowFixture {
    pub source: &'static str,
    pub target: &'static str,
    pub metric: i64,
    pub ord: i64,
    pub county: Option<&'static str>,
    pub sub_county: Option<&'static str>,
    pub agency: Option<&'static str>,
    pub partner: Option<&'static str>,
    pub gender: Option<&'static str>,
    pub cohort: &'static str,
}

impl FlowFixture {
    pub fn new(source: &'static str, target: &'static str, metric: i64, ord: i64, cohort: &'static str) -> Self {
        Self {
            source,
            target,
            metric,
            ord,
            county: Some("Nairobi"),
            sub_county: Some("Westlands"),
            agency: Some("CDC"),
            partner: Some("Partner A"),
            gender: Some("Male"),
            cohort,
        }
    }

    fn located(
        mut self,
        county: &'static str,
        sub_county: &'static str,
        agency: &'static str,
        partner: &'static str,
        gender: &'static str,
    ) -> Self {
        self.county = Some(county);
        self.sub_county = Some(sub_county);
        self.agency = Some(agency);
        self.partner = Some(partner);
        self.gender = Some(gender);
        self
    }
}

const TOTAL: &str = "Total Cases Reported";

fn flow_fixtures() -> Vec<FlowFixture> {
    vec![
        FlowFixture::new(TOTAL, "Linked", 10, 1, "2023-01-01")
            .located("Nairobi", "Westlands", "CDC", "Partner A", "Male"),
        FlowFixture::new(TOTAL, "Linked", 5, 1, "2023-02-01")
            .located("Nairobi", "Kibra", "CDC", "Partner A", "Female"),
        FlowFixture::new(TOTAL, "Not Linked", 3, 1, "2023-02-01")
            .located("Nairobi", "Kibra", "USAID", "Partner B", "Female"),
        FlowFixture::new(TOTAL, "Linked", 7, 1, "2023-03-01")
            .located("Mombasa", "Mvita", "USAID", "Partner B", "Male"),
        FlowFixture::new("Linked", "Initial CD4 Done", 8, 2, "2023-01-01")
            .located("Nairobi", "Westlands", "CDC", "Partner A", "Male"),
        FlowFixture::new("Linked", "Initial CD4 Done", 4, 2, "2023-06-01")
            .located("Mombasa", "Mvita", "USAID", "Partner B", "Female"),
        // outside the default cohort range
        FlowFixture::new(TOTAL, "Linked", 100, 1, "2024-01-01")
            .located("Kisumu", "Kisumu Central", "CDC", "Partner C", "Male"),
        FlowFixture::new(TOTAL, "Linked", 50, 1, "2022-12-01")
            .located("Kisumu", "Nyando", "CDC", "Partner C", "Female"),
    ]
}

pub async fn insert_flow(pool: &SqlitePool, flow: &FlowFixture) {
    sqlx::query(
        "INSERT INTO CSAggregateSentinelSankey
            (source, target, metric, ord, County, SubCounty, AgencyName, PartnerName, Gender, CohortYearMonth)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(flow.source)
    .bind(flow.target)
    .bind(flow.metric)
    .bind(flow.ord)
    .bind(flow.county)
    .bind(flow.sub_county)
    .bind(flow.agency)
    .bind(flow.partner)
    .bind(flow.gender)
    .bind(flow.cohort)
    .execute(pool)
    .await
    .expect("insert flow fixture");
}

/// One sentinel event row; flags are the column names set to 1.
#[derive(Debug, Clone)]
pub struct EventFixture {
    pub gender: &'static str,
    pub county: &'static str,
    pub sub_county: &'static str,
    pub cohort: &'static str,
    pub flags: &'static [&'static str],
}

fn event_fixtures() -> Vec<EventFixture> {
    vec![
        EventFixture {
            gender: "Male",
            county: "Nairobi",
            sub_county: "Westlands",
            cohort: "2023-01-01",
            flags: &[
                "LinkedToART", "WithBaselineCD4", "AHD", "WithInitialViralLoad",
                "IsSuppressedInitialViralload", "RegimenNotChanged", "LatestVLSuppressed", "PatientRetained",
            ],
        },
        EventFixture {
            gender: "Male",
            county: "Nairobi",
            sub_county: "Kibra",
            cohort: "2023-02-01",
            flags: &[
                "LinkedToART", "WithoutBaselineCD4", "NotStaged", "WithoutInitialViralLoad",
                "RegimenChanged", "LatestVLNotSuppressed", "PatientNotRetained",
            ],
        },
        EventFixture {
            gender: "Female",
            county: "Mombasa",
            sub_county: "Mvita",
            cohort: "2023-03-01",
            flags: &[
                "LinkedToART", "WithBaselineCD4", "WithInitialViralLoad",
                "RegimenNotChanged", "LatestVLSuppressed", "PatientRetained",
            ],
        },
        EventFixture {
            gender: "Female",
            county: "Nairobi",
            sub_county: "Kibra",
            cohort: "2023-04-01",
            flags: &["NotLinkedToART"],
        },
        EventFixture {
            gender: "Female",
            county: "Mombasa",
            sub_county: "Mvita",
            cohort: "2023-05-01",
            flags: &["NotLinkedToART"],
        },
        // outside the default cohort range
        EventFixture {
            gender: "Male",
            county: "Kisumu",
            sub_county: "Nyando",
            cohort: "2024-01-01",
            flags: &["NotLinkedToART"],
        },
        EventFixture {
            gender: "Female",
            county: "Nairobi",
            sub_county: "Westlands",
            cohort: "2022-12-01",
            flags: &["LinkedToART", "WithBaselineCD4", "AHD"],
        },
    ]
}

pub async fn insert_event(pool: &SqlitePool, event: &EventFixture) {
    let mut columns = vec!["Gender", "County", "SubCounty", "AgencyName", "PartnerName", "CohortYearMonth"];
    columns.extend_from_slice(event.flags);

    let placeholders = vec!["?"; 6].join(", ");
    let ones = vec!["1"; event.flags.len()];
    let values = if ones.is_empty() {
        placeholders
    } else {
        format!("{}, {}", placeholders, ones.join(", "))
    };

    let sql = format!(
        "INSERT INTO CSAggregateSentinelEvents ({}) VALUES ({})",
        columns.join(", "),
        values
    );
    sqlx::query(&sql)
        .bind(event.gender)
        .bind(event.county)
        .bind(event.sub_county)
        .bind("CDC")
        .bind("Partner A")
        .bind(event.cohort)
        .execute(pool)
        .await
        .expect("insert event fixture");
}
