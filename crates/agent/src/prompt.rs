use olivia_core::domain::Domain;
use olivia_core::policy::PolicyBundle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the domain-scoped prompt. Only the policy text relevant to the
/// routed domain is included, plus the FAQ.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    max_lines: usize,
}

impl PromptBuilder {
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }

    pub fn build(&self, question: &str, domain: Domain, policies: &PolicyBundle) -> Prompt {
        let mut system = format!(
            "Eres OLIVIA, la asistente de Recursos Humanos de la empresa. \
             Responde en español, con un tono cordial y directo. \
             Responde solo con la información de las políticas incluidas abajo; \
             si la respuesta no está en ellas, indica que la consulta debe verse con Recursos Humanos. \
             No inventes montos, fechas ni plazos. \
             Usa como máximo {} líneas y no agregues despedidas.",
            self.max_lines
        );

        if let Some((title, text)) = scoped_policy(domain, policies) {
            system.push_str(&format!("\n\n### Política de {title}\n{}", text.trim()));
        }
        if !policies.faq.trim().is_empty() {
            system.push_str(&format!("\n\n### Preguntas frecuentes\n{}", policies.faq.trim()));
        }

        let user = format!("Tema: {}\nPregunta: {}", domain.display_name(), question.trim());
        Prompt { system, user }
    }
}

fn scoped_policy(domain: Domain, policies: &PolicyBundle) -> Option<(&'static str, &str)> {
    let (title, text) = match domain {
        Domain::Vacation => ("vacaciones", policies.vacation.as_str()),
        Domain::Leave | Domain::Biometrics => ("licencias y asistencia", policies.leave.as_str()),
        Domain::Purchases => ("compras", policies.purchases.as_str()),
        Domain::Commissions => ("comisiones", policies.commissions.as_str()),
        Domain::Payroll | Domain::Insurance => return None,
    };
    (!text.trim().is_empty()).then_some((title, text))
}
