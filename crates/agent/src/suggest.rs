use std::sync::Arc;

use olivia_core::access::{slug, AccessEntry, AccessMap};
use olivia_core::domain::Domain;
use olivia_core::text::{contains_any, normalize};

pub const MAX_SUGGESTIONS: usize = 2;

pub const EMAIL_LABEL: &str = "Correo corporativo";
pub const HR_PORTAL_LABEL: &str = "Portal RRHH";
pub const BIOMETRIC_PORTAL_LABEL: &str = "Portal Biométrico";
pub const HELP_DESK_LABEL: &str = "Mesa de Ayuda";

/// Region word and its schedule entry, in the order both are offered.
pub const REGION_SCHEDULES: &[(&str, &str)] =
    &[("norte", "Horario Región Norte"), ("sur", "Horario Región Sur")];

const EMAIL_TERMS: &[&str] = &["correo", "webmail", "outlook", "email", "e-mail", "bandeja de entrada"];
const SCHEDULE_TERMS: &[&str] = &["horario", "hora de entrada", "hora de salida", "jornada"];
const HR_PORTAL_TERMS: &[&str] =
    &["boleta", "portal", "constancia", "certificado de trabajo", "intranet", "solicitud"];
const DEVICE_TERMS: &[&str] = &["biometrico", "huella", "marcacion", "marcar", "reloj marcador"];
const TICKET_TERMS: &[&str] = &["ticket", "mesa de ayuda", "soporte", "incidencia", "helpdesk"];

#[derive(Clone)]
pub struct AccessSuggester {
    access: Arc<AccessMap>,
}

impl AccessSuggester {
    pub fn new(access: Arc<AccessMap>) -> Self {
        Self { access }
    }

    /// Quick links for a query, at most two, first occurrence kept. Labels
    /// absent from the access map are skipped. A schedule question naming no
    /// region gets only the two region links, whatever else it mentions.
    pub fn suggest(&self, query: &str, domain: Domain) -> Vec<AccessEntry> {
        let normalized = normalize(query);
        let schedules = schedule_labels(&normalized);

        if schedules.len() == REGION_SCHEDULES.len() {
            let choice = self.resolve(&schedules);
            if Self::is_region_choice(&choice) {
                return choice;
            }
        }

        let mut labels = Vec::new();

        if contains_any(&normalized, EMAIL_TERMS) {
            labels.push(EMAIL_LABEL);
        }

        labels.extend(schedules);

        let portal_domain = matches!(domain, Domain::Payroll | Domain::Vacation | Domain::Leave);
        if portal_domain && contains_any(&normalized, HR_PORTAL_TERMS) {
            labels.push(HR_PORTAL_LABEL);
        }

        if domain == Domain::Biometrics || contains_any(&normalized, DEVICE_TERMS) {
            labels.push(BIOMETRIC_PORTAL_LABEL);
        }

        if contains_any(&normalized, TICKET_TERMS) {
            labels.push(HELP_DESK_LABEL);
        }

        self.resolve(&labels)
    }

    fn resolve(&self, labels: &[&str]) -> Vec<AccessEntry> {
        let mut entries: Vec<AccessEntry> = Vec::new();
        for label in labels {
            let Some(entry) = self.access.find_by_label(label) else {
                continue;
            };
            if entries.iter().any(|seen| seen.slug == entry.slug) {
                continue;
            }
            entries.push(entry.clone());
            if entries.len() == MAX_SUGGESTIONS {
                break;
            }
        }
        entries
    }

    /// True when the entries are exactly the two region schedules.
    pub fn is_region_choice(entries: &[AccessEntry]) -> bool {
        entries.len() == REGION_SCHEDULES.len()
            && entries
                .iter()
                .zip(REGION_SCHEDULES)
                .all(|(entry, (_, label))| entry.slug == slug(label))
    }
}

/// Schedule entries for a normalized query: the named regions, or every
/// region when none is named. Empty for non-schedule queries.
fn schedule_labels(normalized: &str) -> Vec<&'static str> {
    if !contains_any(normalized, SCHEDULE_TERMS) {
        return Vec::new();
    }

    let words = normalized
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();
    let named = REGION_SCHEDULES
        .iter()
        .filter(|(region, _)| words.contains(region))
        .map(|(_, label)| *label)
        .collect::<Vec<_>>();
    if named.is_empty() {
        REGION_SCHEDULES.iter().map(|(_, label)| *label).collect()
    } else {
        named
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use olivia_core::access::AccessMap;
    use olivia_core::domain::Domain;

    use super::AccessSuggester;

    fn suggester() -> AccessSuggester {
        AccessSuggester::new(Arc::new(AccessMap::build([
            ("Correo corporativo", "https://mail.example.com"),
            ("Horario Región Norte", "https://docs.example.com/horario-norte"),
            ("Horario Región Sur", "https://docs.example.com/horario-sur"),
            ("Portal RRHH", "https://rrhh.example.com"),
            ("Portal Biométrico", "https://bio.example.com"),
            ("Mesa de Ayuda", "https://ayuda.example.com"),
        ])))
    }

    fn labels(query: &str, domain: Domain) -> Vec<String> {
        suggester().suggest(query, domain).into_iter().map(|entry| entry.label).collect()
    }

    #[test]
    fn schedule_without_region_offers_both_in_order() {
        let entries = suggester().suggest("¿Cuál es mi horario?", Domain::Leave);
        assert_eq!(
            entries.iter().map(|entry| entry.label.as_str()).collect::<Vec<_>>(),
            vec!["Horario Región Norte", "Horario Región Sur"]
        );
        assert!(AccessSuggester::is_region_choice(&entries));
    }

    #[test]
    fn schedule_with_region_offers_only_that_region() {
        assert_eq!(labels("horario de la zona NORTE", Domain::Leave), vec!["Horario Región Norte"]);
        assert_eq!(labels("horario sur", Domain::Leave), vec!["Horario Región Sur"]);
    }

    #[test]
    fn region_words_match_whole_words_only() {
        assert_eq!(
            labels("horario de la tienda en surco", Domain::Leave),
            vec!["Horario Región Norte", "Horario Región Sur"]
        );
    }

    #[test]
    fn hr_portal_depends_on_domain() {
        assert_eq!(labels("no encuentro mi boleta", Domain::Payroll), vec!["Portal RRHH"]);
        assert!(labels("no encuentro mi boleta", Domain::Commissions).is_empty());
    }

    #[test]
    fn biometrics_domain_or_device_terms_offer_biometric_portal() {
        assert_eq!(labels("consulta general", Domain::Biometrics), vec!["Portal Biométrico"]);
        assert_eq!(labels("mi huella no pasa", Domain::Leave), vec!["Portal Biométrico"]);
    }

    #[test]
    fn caps_at_two_and_deduplicates() {
        let found = labels("mi correo y la huella, abro un ticket", Domain::Biometrics);
        assert_eq!(found, vec!["Correo corporativo", "Portal Biométrico"]);
    }

    #[test]
    fn region_choice_is_never_split_by_other_links() {
        let entries = suggester().suggest("correo y horario", Domain::Leave);
        assert_eq!(
            entries.iter().map(|entry| entry.label.as_str()).collect::<Vec<_>>(),
            vec!["Horario Región Norte", "Horario Región Sur"]
        );
        assert!(AccessSuggester::is_region_choice(&entries));

        assert_eq!(
            labels("correo y horario del norte", Domain::Leave),
            vec!["Correo corporativo", "Horario Región Norte"]
        );
    }

    #[test]
    fn missing_labels_are_omitted() {
        let empty = AccessSuggester::new(Arc::new(AccessMap::default()));
        assert!(empty.suggest("correo y horario", Domain::Leave).is_empty());
        assert!(labels("hola", Domain::Leave).is_empty());
    }
}
