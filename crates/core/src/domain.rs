use serde::{Deserialize, Serialize};

/// Coarse HR topic used to scope policy text and canned answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Biometrics,
    Payroll,
    Insurance,
    Vacation,
    Leave,
    Purchases,
    Commissions,
}

/// Routing falls back here when nothing scores.
pub const DEFAULT_DOMAIN: Domain = Domain::Leave;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomainKeywords {
    pub domain: Domain,
    pub keywords: &'static [&'static str],
}

/// Declaration order matters: ties go to the earlier row.
///
/// Keywords are stored normalized. No keyword may be a substring of another
/// domain's keyword, otherwise the shorter one would tie at 100.
pub const DOMAIN_TABLE: &[DomainKeywords] = &[
    DomainKeywords {
        domain: Domain::Biometrics,
        keywords: &[
            "biometrico",
            "huella",
            "marcacion",
            "marcar",
            "reloj marcador",
            "asistencia",
            "registro de entrada",
        ],
    },
    DomainKeywords {
        domain: Domain::Payroll,
        keywords: &["nomina", "planilla", "boleta de pago", "sueldo", "salario", "quincena"],
    },
    DomainKeywords {
        domain: Domain::Insurance,
        keywords: &["seguro", "seguro medico", "poliza", "aseguradora", "eps", "salud", "clinica"],
    },
    DomainKeywords {
        domain: Domain::Vacation,
        keywords: &["vacaciones", "vacacion", "descanso vacacional", "dias libres", "feriado largo"],
    },
    DomainKeywords {
        domain: Domain::Leave,
        keywords: &[
            "permiso",
            "licencia",
            "ausencia",
            "falta",
            "maternidad",
            "paternidad",
            "lactancia",
            "duelo",
            "fallecimiento",
            "tramite personal",
        ],
    },
    DomainKeywords {
        domain: Domain::Purchases,
        keywords: &[
            "compra",
            "compras",
            "descuento de empleado",
            "lentes para colaboradores",
            "beneficio de compra",
            "convenio",
        ],
    },
    DomainKeywords {
        domain: Domain::Commissions,
        keywords: &["comision", "comisiones", "metas de venta", "incentivo", "bono", "ventas"],
    },
];

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Biometrics => "biometrics",
            Self::Payroll => "payroll",
            Self::Insurance => "insurance",
            Self::Vacation => "vacation",
            Self::Leave => "leave",
            Self::Purchases => "purchases",
            Self::Commissions => "commissions",
        }
    }

    /// Spanish name used inside prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Biometrics => "asistencia y marcación biométrica",
            Self::Payroll => "planilla y boletas de pago",
            Self::Insurance => "seguros",
            Self::Vacation => "vacaciones",
            Self::Leave => "licencias y permisos",
            Self::Purchases => "compras y beneficios para colaboradores",
            Self::Commissions => "comisiones",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        DOMAIN_TABLE
            .iter()
            .find(|row| row.domain == *self)
            .map(|row| row.keywords)
            .unwrap_or(&[])
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Domain, DOMAIN_TABLE};
    use crate::text::normalize;

    #[test]
    fn table_declares_every_domain_once_in_order() {
        let order = DOMAIN_TABLE.iter().map(|row| row.domain).collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                Domain::Biometrics,
                Domain::Payroll,
                Domain::Insurance,
                Domain::Vacation,
                Domain::Leave,
                Domain::Purchases,
                Domain::Commissions,
            ]
        );
    }

    #[test]
    fn keywords_are_stored_normalized() {
        for row in DOMAIN_TABLE {
            for keyword in row.keywords {
                assert_eq!(normalize(keyword), *keyword, "{keyword} is not normalized");
            }
        }
    }

    #[test]
    fn no_keyword_is_contained_in_another_domains_keyword() {
        for row in DOMAIN_TABLE {
            for other in DOMAIN_TABLE.iter().filter(|other| other.domain != row.domain) {
                for keyword in row.keywords {
                    for candidate in other.keywords {
                        assert!(
                            !candidate.contains(keyword),
                            "`{keyword}` ({}) is inside `{candidate}` ({})",
                            row.domain,
                            other.domain
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn keywords_lookup_matches_table() {
        assert!(Domain::Vacation.keywords().contains(&"vacaciones"));
        assert_eq!(Domain::Leave.as_str(), "leave");
    }
}
