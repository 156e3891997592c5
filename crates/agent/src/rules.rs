//! Canned answers for policy-sensitive questions.
//!
//! These are returned verbatim and never paraphrased by the model. Rules are
//! evaluated in declaration order and the first hit wins, so a more specific
//! or more sensitive rule must always sit above a generic one (attendance
//! omission before personal errands, maternity before paternity).

use olivia_core::fuzzy::{matches_any, DEFAULT_RULE_THRESHOLD};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntentRule {
    pub id: &'static str,
    /// Normalized trigger phrases, at least four characters each.
    pub triggers: &'static [&'static str],
    pub response: &'static str,
    pub threshold: u8,
}

pub const CANONICAL_RULES: &[IntentRule] = &[
    IntentRule {
        id: "attendance_omission",
        triggers: &[
            "omision de marcacion",
            "olvide marcar",
            "me olvide de marcar",
            "no marque",
            "no registre mi entrada",
            "no registre mi salida",
            "olvide registrar mi asistencia",
        ],
        response: "Si omitiste una marcación, repórtalo el mismo día a tu jefe inmediato y regularízala en el Portal Biométrico. Una omisión no regularizada se considera inasistencia y se descuenta conforme al reglamento interno.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "lateness",
        triggers: &["tardanza", "llegue tarde", "llegar tarde", "llegada tarde", "minutos tarde"],
        response: "Las tardanzas se registran automáticamente con el biométrico. La tolerancia es de 5 minutos y las tardanzas acumuladas se descuentan en planilla. Motivos como el tráfico o quedarse dormido no las justifican.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "excluded_excuses",
        triggers: &[
            "trafico",
            "me quede dormido",
            "me quede dormida",
            "se me hizo tarde",
            "no sono la alarma",
            "problemas de transporte",
        ],
        response: "El tráfico, quedarse dormido u otros contratiempos personales no son causas justificadas de tardanza ni de inasistencia. Solo se regulariza con un documento sustentatorio, por ejemplo un descanso médico.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "biometric_device_errors",
        triggers: &[
            "el biometrico no funciona",
            "biometrico malogrado",
            "error en el biometrico",
            "no reconoce mi huella",
            "no lee mi huella",
            "reloj marcador no funciona",
        ],
        response: "Si el biométrico falla, avisa de inmediato a tu jefe con una foto del error y registra tu asistencia en el Portal Biométrico. Abre también un ticket en la Mesa de Ayuda para que revisen el equipo.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "shift_change",
        triggers: &["cambio de turno", "cambiar mi turno", "intercambiar turno", "permuta de turno"],
        response: "Los cambios de turno se coordinan con tu jefe inmediato con al menos 48 horas de anticipación y deben quedar registrados en el Portal RRHH. No se aceptan cambios acordados solo de palabra.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "maternity",
        triggers: &["maternidad", "descanso prenatal", "descanso postnatal", "estoy embarazada", "embarazo"],
        response: "La licencia por maternidad es de 98 días: 49 de descanso prenatal y 49 de postnatal, y puedes acumular el prenatal al postnatal. Presenta tu certificado médico a Recursos Humanos para gestionar el subsidio.",
        // "maternidad" and "paternidad" differ by one letter
        threshold: 95,
    },
    IntentRule {
        id: "paternity",
        triggers: &["paternidad", "nacimiento de mi hijo", "nacimiento de mi hija", "mi esposa dio a luz"],
        response: "La licencia por paternidad es de 10 días calendario consecutivos con goce de haber. Comunícala a tu jefe y a Recursos Humanos y sube el acta de nacimiento al Portal RRHH.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "lactation",
        triggers: &["lactancia", "hora de lactancia", "lactario", "amamantar"],
        response: "Tienes derecho a una hora diaria de lactancia hasta que tu bebé cumpla un año. Coordina con tu jefe si la tomarás al inicio o al final de la jornada.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "bereavement",
        triggers: &[
            "licencia por luto",
            "permiso por luto",
            "fallecio",
            "fallecimiento",
            "duelo",
            "murio mi",
        ],
        response: "Lamentamos tu pérdida. Por fallecimiento de cónyuge, padres, hijos o hermanos te corresponden 5 días de licencia con goce de haber. Presenta el acta de defunción a Recursos Humanos a tu regreso.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "personal_errands",
        triggers: &[
            "permiso personal",
            "pedir permiso",
            "tramite personal",
            "diligencia personal",
            "asunto personal",
            "salir temprano",
        ],
        response: "Los permisos por trámites personales se piden a tu jefe inmediato con 24 horas de anticipación y se registran en el Portal RRHH. Las horas de permiso se compensan o se descuentan según lo que acuerdes con tu jefe.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "vacation_request",
        triggers: &[
            "pedir vacaciones",
            "solicitar vacaciones",
            "programar vacaciones",
            "tomar vacaciones",
            "como saco vacaciones",
        ],
        response: "Las vacaciones se solicitan en el Portal RRHH con al menos 15 días de anticipación y requieren la aprobación de tu jefe inmediato. Puedes fraccionarlas, pero al menos 7 días deben ser continuos.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "payroll_payslip",
        triggers: &[
            "boleta de pago",
            "mi boleta",
            "descargar boleta",
            "fecha de pago",
            "dia de pago",
            "cuando pagan",
        ],
        response: "El pago de haberes se realiza el último día hábil de cada mes, con adelanto de quincena el día 15. Tus boletas de pago están disponibles en el Portal RRHH desde la fecha de pago.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
    IntentRule {
        id: "insurance",
        triggers: &[
            "seguro medico",
            "seguro de salud",
            "afiliacion eps",
            "afiliarme a la eps",
            "plan eps",
            "seguro vida ley",
        ],
        response: "Puedes afiliarte a la EPS dentro de los 30 días posteriores a tu ingreso o en la campaña anual. El aporte del plan se descuenta en planilla y Recursos Humanos te da el detalle de coberturas.",
        threshold: DEFAULT_RULE_THRESHOLD,
    },
];

#[derive(Clone, Debug)]
pub struct RuleBook {
    rules: &'static [IntentRule],
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::new(CANONICAL_RULES)
    }
}

impl RuleBook {
    pub fn new(rules: &'static [IntentRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [IntentRule] {
        self.rules
    }

    /// First rule whose best trigger score reaches its threshold.
    pub fn detect(&self, query: &str) -> Option<&'static IntentRule> {
        let hit = self.rules.iter().find(|rule| matches_any(query, rule.triggers, rule.threshold));
        if let Some(rule) = hit {
            debug!(event_name = "rules.matched", rule_id = rule.id, "deterministic rule matched");
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use olivia_core::text::normalize;

    use super::{IntentRule, RuleBook, CANONICAL_RULES};

    fn detect_id(query: &str) -> Option<&'static str> {
        RuleBook::default().detect(query).map(|rule| rule.id)
    }

    #[test]
    fn canonical_order_is_fixed() {
        let ids = CANONICAL_RULES.iter().map(|rule| rule.id).collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                "attendance_omission",
                "lateness",
                "excluded_excuses",
                "biometric_device_errors",
                "shift_change",
                "maternity",
                "paternity",
                "lactation",
                "bereavement",
                "personal_errands",
                "vacation_request",
                "payroll_payslip",
                "insurance",
            ]
        );
    }

    #[test]
    fn triggers_are_normalized_and_long_enough() {
        for rule in CANONICAL_RULES {
            assert!(!rule.triggers.is_empty(), "rule {} has no triggers", rule.id);
            for trigger in rule.triggers {
                assert_eq!(normalize(trigger), *trigger, "rule {} trigger `{trigger}`", rule.id);
                assert!(trigger.chars().count() >= 4, "rule {} trigger `{trigger}`", rule.id);
            }
            assert!(rule.threshold <= 100);
        }
    }

    #[test]
    fn omission_wins_over_lower_priority_groups() {
        assert_eq!(
            detect_id("Olvidé marcar mi salida, ¿tengo que pedir permiso?"),
            Some("attendance_omission")
        );
        assert_eq!(detect_id("no marqué porque el biométrico no funciona"), Some("attendance_omission"));
    }

    #[test]
    fn lateness_precedes_excuses() {
        assert_eq!(detect_id("llegué tarde por el tráfico"), Some("lateness"));
        assert_eq!(detect_id("había mucho tráfico hoy"), Some("excluded_excuses"));
    }

    #[test]
    fn maternity_does_not_swallow_paternity() {
        assert_eq!(detect_id("licencia por maternidad"), Some("maternity"));
        assert_eq!(detect_id("licencia por paternidad"), Some("paternity"));
    }

    #[test]
    fn tolerates_typos_and_accents() {
        assert_eq!(detect_id("¿Cuándo PAGAN este mes?"), Some("payroll_payslip"));
        assert_eq!(detect_id("quiero solicitar vacasiones"), Some("vacation_request"));
        assert_eq!(detect_id("falleció mi abuelo"), Some("bereavement"));
    }

    #[test]
    fn unrelated_text_matches_nothing() {
        assert_eq!(detect_id("zzz qqq xyz"), None);
        assert_eq!(detect_id("hola"), None);
        assert_eq!(detect_id(""), None);
        assert_eq!(detect_id("¿cuál es mi horario?"), None);
    }

    #[test]
    fn single_words_do_not_trigger_longer_phrases() {
        assert_ne!(detect_id("permiso"), Some("bereavement"));
        assert_ne!(detect_id("licencia"), Some("bereavement"));
        assert_eq!(detect_id("permiso"), None);
        assert_eq!(detect_id("licencia"), None);
        assert_eq!(detect_id("huella"), None);
        assert_eq!(detect_id("pedir"), None);
        assert_eq!(detect_id("necesito un permiso"), None);
    }

    #[test]
    fn full_phrases_still_match_inside_longer_questions() {
        assert_eq!(detect_id("¿cómo pido permiso por luto?"), Some("bereavement"));
        assert_eq!(detect_id("quiero pedir permiso para el viernes"), Some("personal_errands"));
        assert_eq!(detect_id("no lee mi huella desde ayer"), Some("biometric_device_errors"));
    }

    #[test]
    fn custom_thresholds_are_respected() {
        const STRICT: &[IntentRule] = &[IntentRule {
            id: "strict",
            triggers: &["planilla"],
            response: "ok",
            threshold: 100,
        }];
        let book = RuleBook::new(STRICT);
        assert!(book.detect("mi planilla").is_some());
        assert!(book.detect("mi planila").is_none());
    }
}
