use crate::rules::ruleset::Ruleset;
use crate::rules::{assess, is_vfr, RuleCheck};
use crate::store::error::CacheError;
use crate::store::{ObservationStore, VerdictKey, VerdictRecord};
use crate::types::observation::Observation;
use chrono::{DateTime, Utc};

/// Flight suitability of one observation under one ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRow {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    pub ruleset: String,
    pub vfr: bool,
    pub flyable: bool,
    /// Empty when `flyable`.
    pub failed: Vec<RuleCheck>,
}

/// Evaluates every observation and stores the verdicts, replacing any earlier
/// verdict for the same station, time and ruleset.
pub async fn record_verdicts<C: ObservationStore>(
    store: &C,
    observations: &[Observation],
    ruleset: &Ruleset,
) -> Result<Vec<AnalysisRow>, CacheError> {
    let rows = observations
        .iter()
        .map(|observation| {
            let verdict = assess(observation, ruleset);
            AnalysisRow {
                station: observation.station().to_string(),
                timestamp: observation.timestamp(),
                ruleset: ruleset.name.clone(),
                vfr: is_vfr(observation),
                flyable: verdict.is_flyable(),
                failed: verdict.failed,
            }
        })
        .collect::<Vec<_>>();

    for row in &rows {
        store.upsert_verdict(
            VerdictKey {
                station: row.station.clone(),
                timestamp: row.timestamp,
                ruleset: row.ruleset.clone(),
            },
            VerdictRecord {
                vfr: row.vfr,
                flyable: row.flyable,
            },
        )?;
    }
    store.commit().await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::store::memory::MemoryStore;

    fn key(observation: &Observation, ruleset: &str) -> VerdictKey {
        VerdictKey {
            station: observation.station().to_string(),
            timestamp: observation.timestamp(),
            ruleset: ruleset.to_string(),
        }
    }

    #[tokio::test]
    async fn verdicts_follow_the_ruleset() {
        let store = MemoryStore::new();
        let calm = parse("202301020920 METAR EGKA 020920Z 24008KT 9999 BKN020 06/04 Q1011").unwrap();
        let windy = parse("202301021020 METAR EGKA 021020Z 24022G35KT 0800 OVC004 06/04 Q1011").unwrap();
        let ruleset = Ruleset::builder()
            .name("default")
            .min_visibility(1500)
            .min_ceiling(1500)
            .max_wind_speed(14)
            .max_wind_gust(25)
            .build();

        let rows = record_verdicts(&store, &[calm.clone(), windy.clone()], &ruleset)
            .await
            .unwrap();

        assert!(rows[0].vfr && rows[0].flyable);
        assert!(rows[0].failed.is_empty());
        assert!(!rows[1].vfr && !rows[1].flyable);
        assert_eq!(
            rows[1].failed,
            vec![
                RuleCheck::Visibility,
                RuleCheck::Ceiling,
                RuleCheck::WindSpeed,
                RuleCheck::WindGust
            ]
        );
        assert_eq!(
            store.verdict(&key(&windy, "default")).unwrap(),
            Some(VerdictRecord { vfr: false, flyable: false })
        );
    }

    #[tokio::test]
    async fn rerunning_replaces_the_verdict() {
        let store = MemoryStore::new();
        let observation =
            parse("202301020920 METAR EGKA 020920Z 24018KT 9999 BKN020 06/04 Q1011").unwrap();
        let strict = Ruleset::builder().name("club").max_wind_speed(15).build();
        let relaxed = Ruleset::builder().name("club").max_wind_speed(20).build();

        record_verdicts(&store, std::slice::from_ref(&observation), &strict)
            .await
            .unwrap();
        assert_eq!(
            store.verdict(&key(&observation, "club")).unwrap(),
            Some(VerdictRecord { vfr: true, flyable: false })
        );

        record_verdicts(&store, std::slice::from_ref(&observation), &relaxed)
            .await
            .unwrap();
        assert_eq!(
            store.verdict(&key(&observation, "club")).unwrap(),
            Some(VerdictRecord { vfr: true, flyable: true })
        );
    }
}
