use olivia_core::domain::{Domain, DomainKeywords, DEFAULT_DOMAIN, DOMAIN_TABLE};
use olivia_core::fuzzy::similarity;
use olivia_core::text::normalize;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainScore {
    pub domain: Domain,
    pub score: u8,
}

#[derive(Clone, Debug)]
pub struct DomainRouter {
    table: &'static [DomainKeywords],
}

impl Default for DomainRouter {
    fn default() -> Self {
        Self::new(DOMAIN_TABLE)
    }
}

impl DomainRouter {
    pub fn new(table: &'static [DomainKeywords]) -> Self {
        Self { table }
    }

    /// Per-domain best keyword score, in table order.
    pub fn scores(&self, query: &str) -> Vec<DomainScore> {
        let normalized = normalize(query);
        self.table
            .iter()
            .map(|row| DomainScore {
                domain: row.domain,
                score: row
                    .keywords
                    .iter()
                    .map(|keyword| similarity(&normalized, keyword))
                    .max()
                    .unwrap_or(0),
            })
            .collect()
    }

    /// Strictly highest score wins, ties keep the earlier domain and an
    /// all-zero row routes to the default domain.
    pub fn route(&self, query: &str) -> Domain {
        let scores = self.scores(query);
        let mut best: Option<DomainScore> = None;
        for candidate in &scores {
            if candidate.score == 0 {
                continue;
            }
            if best.map_or(true, |current| candidate.score > current.score) {
                best = Some(*candidate);
            }
        }

        let domain = best.map(|winner| winner.domain).unwrap_or(DEFAULT_DOMAIN);
        debug!(
            event_name = "router.domain_selected",
            domain = %domain,
            score = best.map(|winner| winner.score).unwrap_or(0),
            "domain routed"
        );
        domain
    }
}

#[cfg(test)]
mod tests {
    use olivia_core::domain::{Domain, DomainKeywords, DOMAIN_TABLE};

    use super::DomainRouter;

    #[test]
    fn every_keyword_routes_to_its_own_domain() {
        let router = DomainRouter::default();
        for row in DOMAIN_TABLE {
            for keyword in row.keywords {
                assert_eq!(router.route(keyword), row.domain, "keyword `{keyword}`");
            }
        }
    }

    #[test]
    fn routes_full_sentences() {
        let router = DomainRouter::default();
        assert_eq!(router.route("¿Cuántos días de VACACIONES me quedan?"), Domain::Vacation);
        assert_eq!(router.route("quiero saber de mi comisión de este mes"), Domain::Commissions);
        assert_eq!(router.route("cómo me afilio al seguro médico"), Domain::Insurance);
        assert_eq!(router.route("mi huella no aparece"), Domain::Biometrics);
    }

    #[test]
    fn empty_query_routes_to_leave() {
        let router = DomainRouter::default();
        assert_eq!(router.route(""), Domain::Leave);
        assert!(router.scores("").iter().all(|row| row.score == 0));
    }

    #[test]
    fn ties_keep_declaration_order() {
        const TIED: &[DomainKeywords] = &[
            DomainKeywords { domain: Domain::Purchases, keywords: &["lentes"] },
            DomainKeywords { domain: Domain::Payroll, keywords: &["lentes"] },
        ];
        let router = DomainRouter::new(TIED);
        assert_eq!(router.route("lentes nuevos"), Domain::Purchases);
    }

    #[test]
    fn scores_follow_table_order() {
        let scores = DomainRouter::default().scores("planilla");
        let domains = scores.iter().map(|row| row.domain).collect::<Vec<_>>();
        assert_eq!(domains, DOMAIN_TABLE.iter().map(|row| row.domain).collect::<Vec<_>>());
        assert_eq!(scores[1].score, 100);
    }
}
