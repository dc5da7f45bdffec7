//! Prompt construction for plant advice

use super::AdviceRequest;
use crate::database::PlantStatus;
use chrono::{DateTime, NaiveDate, Utc};

/// System prompt sent with every completion
pub const SYSTEM_PROMPT: &str = "Tu es un expert en jardinage avec 20 ans d'expérience. \
Donne des conseils précis, pratiques et adaptés à chaque situation. \
Utilise un ton bienveillant et professionnel. \
Réponds toujours en français en 2-3 phrases maximum.";

const NOT_SPECIFIED: &str = "non précisée";

/// Age of a plant in days, rounded up: any started day counts.
/// The planting date is taken at midnight UTC.
pub fn plant_age_days(planting_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let planted = planting_date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let seconds = (now - planted).num_seconds().abs();
    (seconds + 86_399) / 86_400
}

/// Describe the most recent measurement (the first of the list)
pub fn measurement_info(req: &AdviceRequest) -> String {
    let Some(latest) = req.measurements.first() else {
        return "Aucune mesure disponible".to_string();
    };

    let mut parts = Vec::new();
    if let Some(height) = latest.height.filter(|h| *h != 0.0) {
        parts.push(format!("hauteur: {}cm", height));
    }
    if let Some(width) = latest.width.filter(|w| *w != 0.0) {
        parts.push(format!("largeur: {}cm", width));
    }

    if parts.is_empty() {
        "Mesures non spécifiées".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn temperature_info(temperature: Option<f64>) -> String {
    match temperature {
        Some(t) => format!("{}°C", t),
        None => "température inconnue".to_string(),
    }
}

fn age_info(req: &AdviceRequest, now: DateTime<Utc>) -> String {
    match req.planting_date() {
        Some(date) => format!(
            "{} jours (plantée le {})",
            plant_age_days(date, now),
            date.format("%d/%m/%Y")
        ),
        None => "inconnu".to_string(),
    }
}

fn status_info(status: Option<&str>) -> String {
    match status {
        Some(raw) => raw
            .parse::<PlantStatus>()
            .map(|s| s.label().to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => NOT_SPECIFIED.to_string(),
    }
}

fn or_unspecified(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SPECIFIED)
}

/// Build the user prompt for one plant
pub fn build_prompt(req: &AdviceRequest, now: DateTime<Utc>) -> String {
    format!(
        "En tant qu'expert en jardinage, analyse cette plante et donne un diagnostic complet :

Informations de la plante :
- Nom : {name}
- Variété/Catégorie : {variety}
- Âge : {age}
- Localisation : {location}
- Statut actuel : {status}
- Mesures actuelles : {measurements}
- Température ambiante : {temperature}

Donne-moi un diagnostic en 2-3 phrases qui inclut :
1. L'état général de la plante basé sur son âge et ses mesures
2. Des conseils spécifiques selon la température et la saison
3. Des recommandations d'arrosage et de soins

Réponds en français de manière claire et pratique.",
        name = req.plant_name,
        variety = or_unspecified(req.variety.as_deref()),
        age = age_info(req, now),
        location = or_unspecified(req.location.as_deref()),
        status = status_info(req.status.as_deref()),
        measurements = measurement_info(req),
        temperature = temperature_info(req.temperature),
    )
}
