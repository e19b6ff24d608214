//! Reply templates.
//!
//! Replies use `**bold**` markup and `•` bullets; the view layer renders
//! them line by line.

use mediplan_core::Store;

use crate::format::{format_currency, format_short_date};
use crate::intents::Intent;

/// First message of every conversation.
pub const GREETING: &str = "Bonjour ! 👋 Je suis votre assistant IA MediPlan. Je peux vous aider à:\n\n\
• Analyser vos rendez-vous\n\
• Voir les paiements en attente\n\
• Obtenir des statistiques\n\
• Vous donner des recommandations\n\n\
Que puis-je faire pour vous ?";

pub const HELP: &str = "🤖 **Je peux vous aider avec:**\n\n\
• **Rendez-vous:** \"Quels sont mes RDV aujourd'hui ?\"\n\
• **Patients:** \"Montre-moi les patients récents\"\n\
• **Paiements:** \"Quels paiements sont en attente ?\"\n\
• **Statistiques:** \"Donne-moi un résumé\"\n\
• **Conseils:** \"Des suggestions pour améliorer ?\"\n\n\
Posez-moi vos questions en langage naturel !";

pub const NOT_UNDERSTOOD: &str = "Je n'ai pas bien compris votre demande. 🤔\n\n\
Vous pouvez me demander:\n\
• Les RDV du jour\n\
• Les patients récents\n\
• Les paiements en attente\n\
• Un résumé statistique\n\
• Des suggestions d'amélioration";

/// Longest list shown in a single reply.
pub const MAX_LISTED: usize = 5;

/// Absence rate (percent) above which reminders are recommended.
pub const HIGH_ABSENCE_RATE: f64 = 10.0;

/// Pending amount above which payment reminders are recommended.
pub const HIGH_PENDING_AMOUNT: f64 = 1000.0;

/// Patient count below which growth advice is given.
pub const SMALL_PRACTICE: usize = 50;

/// Render the reply for `intent` from the store's current state.
pub fn render(intent: Intent, store: &Store) -> String {
    match intent {
        Intent::TodayAppointments => today_appointments(store),
        Intent::RecentPatients => recent_patients(store),
        Intent::Payments => payments(store),
        Intent::Statistics => statistics(store),
        Intent::Suggestions => suggestions(store),
        Intent::Help => HELP.to_string(),
        Intent::Unknown => NOT_UNDERSTOOD.to_string(),
    }
}

fn patient_name(store: &Store, patient_id: &str) -> String {
    store
        .get_patient_by_id(patient_id)
        .map(|p| p.full_name())
        .unwrap_or_else(|| "Patient inconnu".to_string())
}

fn today_appointments(store: &Store) -> String {
    let mut appointments = store.get_appointments_by_date(store.today());
    if appointments.is_empty() {
        return "📅 Aucun rendez-vous prévu aujourd'hui. Profitez de cette journée calme ! 🌟"
            .to_string();
    }
    appointments.sort_by(|a, b| a.time.cmp(&b.time));

    let mut reply = format!("📅 **{} rendez-vous aujourd'hui:**\n\n", appointments.len());
    for appointment in appointments {
        reply.push_str(&format!(
            "• **{}** - {} ({})\n",
            appointment.time,
            patient_name(store, &appointment.patient_id),
            appointment.kind.label()
        ));
    }
    reply
}

fn recent_patients(store: &Store) -> String {
    let today = store.today();
    let mut reply = format!(
        "👥 **{} patients au total. Voici les {} plus récents:**\n\n",
        store.patients().len(),
        MAX_LISTED
    );
    for patient in store.recent_patients(MAX_LISTED) {
        let age = patient
            .age_on(today)
            .map(|age| format!("{} ans, ", age))
            .unwrap_or_default();
        reply.push_str(&format!(
            "• **{}** - {}inscrit le {}\n",
            patient.full_name(),
            age,
            format_short_date(patient.created_at)
        ));
    }
    reply
}

fn payments(store: &Store) -> String {
    let unpaid = store.unpaid_visits();
    if unpaid.is_empty() {
        return "✅ Excellent ! Tous les paiements sont à jour. Aucune facture en attente."
            .to_string();
    }
    let total: f64 = unpaid.iter().map(|a| a.fee).sum();

    let mut reply = format!(
        "💰 **{} paiements en attente** pour un total de **{}**:\n\n",
        unpaid.len(),
        format_currency(total)
    );
    for appointment in unpaid.iter().take(MAX_LISTED) {
        reply.push_str(&format!(
            "• {} - {} ({})\n",
            patient_name(store, &appointment.patient_id),
            format_currency(appointment.fee),
            format_short_date(appointment.date)
        ));
    }
    if unpaid.len() > MAX_LISTED {
        reply.push_str(&format!("\n... et {} autres.\n", unpaid.len() - MAX_LISTED));
    }
    reply.push_str(
        "\n💡 **Suggestion:** Envoyez des rappels de paiement via SMS ou WhatsApp pour accélérer les encaissements.",
    );
    reply
}

fn statistics(store: &Store) -> String {
    let stats = store.get_stats();
    let attendance = ((100.0 - stats.absence_rate) * 10.0).round() / 10.0;
    let analysis = if stats.absence_rate > HIGH_ABSENCE_RATE {
        "Le taux d'absence est élevé. Pensez à envoyer des rappels automatiques 24h avant chaque RDV."
    } else {
        "Excellent taux de présence ! Continuez ainsi."
    };

    format!(
        "📊 **Résumé de votre cabinet {}:**\n\n\
         • 👥 **{}** patients enregistrés\n\
         • 📅 **{}** RDV aujourd'hui, **{}** à venir\n\
         • 💰 Revenus du mois: **{}**\n\
         • ⏳ En attente: **{}**\n\
         • ✅ Taux de présence: **{}%**\n\
         • 🔔 **{}** rappels envoyés\n\n\
         💡 **Analyse:** {}",
        store.cabinet().name,
        stats.total_patients,
        stats.today_appointments,
        stats.upcoming_appointments,
        format_currency(stats.monthly_revenue),
        format_currency(stats.pending_payments),
        attendance,
        stats.reminders_sent,
        analysis
    )
}

fn suggestions(store: &Store) -> String {
    let stats = store.get_stats();
    let mut reply = String::from("💡 **Suggestions pour optimiser votre cabinet:**\n\n");

    if stats.absence_rate > HIGH_ABSENCE_RATE {
        reply.push_str(
            "🔔 **Rappels automatiques:** Activez les rappels WhatsApp 24h avant chaque RDV pour réduire les absences.\n\n",
        );
    }
    if stats.pending_payments > HIGH_PENDING_AMOUNT {
        reply.push_str(&format!(
            "💰 **Paiements:** Vous avez {} en attente. Configurez les rappels de paiement automatiques.\n\n",
            format_currency(stats.pending_payments)
        ));
    }
    if store.patients().len() < SMALL_PRACTICE {
        reply.push_str(
            "📈 **Croissance:** Développez votre présence en ligne et demandez des avis à vos patients satisfaits.\n\n",
        );
    }

    reply.push_str("⚡ **Automatisation:** Utilisez la facturation automatique après chaque consultation.\n\n");
    reply.push_str("📱 **Mobile:** Proposez la prise de RDV en ligne pour simplifier la vie de vos patients.");
    reply
}
