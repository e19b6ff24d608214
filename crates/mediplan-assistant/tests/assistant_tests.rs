//! Assistant replies against the demo practice.

use std::sync::Arc;

use chrono::NaiveDate;

use mediplan_assistant::{Assistant, Conversation};
use mediplan_core::clock::ManualClock;
use mediplan_core::config::StoreConfig;
use mediplan_core::db::MemoryBackend;
use mediplan_core::models::{AppointmentPatch, AppointmentStatus};
use mediplan_core::Store;

fn demo_store(date: (i32, u32, u32)) -> Store {
    let today = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
    Store::open(
        Box::new(MemoryBackend::new()),
        StoreConfig::default(),
        Arc::new(ManualClock::on(today)),
    )
}

fn blank_store() -> Store {
    Store::open(
        Box::new(MemoryBackend::new()),
        StoreConfig {
            seed_demo_data: false,
            ..StoreConfig::default()
        },
        Arc::new(ManualClock::on(NaiveDate::from_ymd_opt(2025, 1, 13).unwrap())),
    )
}

#[test]
fn test_today_appointments_sorted_by_time() {
    let store = demo_store((2025, 1, 13));
    let reply = Assistant::new(&store).respond("Quels sont mes rendez-vous aujourd'hui ?");

    assert!(reply.starts_with("📅 **3 rendez-vous aujourd'hui:**"));
    let lines: Vec<&str> = reply.lines().filter(|l| l.starts_with('•')).collect();
    assert_eq!(
        lines,
        vec![
            "• **09:00** - Ahmed El Mansouri (Suivi)",
            "• **10:00** - Khadija Ouazzani (Consultation)",
            "• **11:00** - Youssef Tazi (Rééducation)",
        ]
    );
}

#[test]
fn test_quiet_day() {
    let store = demo_store((2025, 1, 12));
    let reply = Assistant::new(&store).respond("rendez-vous today");
    assert!(reply.starts_with("📅 Aucun rendez-vous prévu aujourd'hui."));
}

#[test]
fn test_recent_patients_newest_first() {
    let store = demo_store((2025, 1, 13));
    let reply = Assistant::new(&store).respond("Montre-moi les patients récents");

    assert!(reply.starts_with("👥 **4 patients au total. Voici les 5 plus récents:**"));
    let first = reply.lines().find(|l| l.starts_with('•')).unwrap();
    assert_eq!(first, "• **Salma Chraibi** - 29 ans, inscrit le 01 sept. 2024");
}

#[test]
fn test_payments_use_broad_unpaid_definition() {
    let mut store = demo_store((2025, 1, 13));
    let reply = Assistant::new(&store).respond("Quels paiements sont en attente ?");
    assert!(reply.starts_with("✅ Excellent !"));

    store
        .update_appointment("a2", AppointmentPatch::status(AppointmentStatus::Present))
        .unwrap();
    let reply = Assistant::new(&store).respond("impayé");
    assert!(reply.starts_with("💰 **1 paiements en attente** pour un total de **400 DH**"));
    assert!(reply.contains("• Khadija Ouazzani - 400 DH (13 janv. 2025)"));
    // The dashboard figure only counts completed visits.
    assert_eq!(store.get_stats().pending_payments, 0.0);
}

#[test]
fn test_payments_list_is_capped() {
    let mut store = demo_store((2025, 1, 13));
    for id in ["a1", "a2", "a3", "a4"] {
        store
            .update_appointment(id, AppointmentPatch::status(AppointmentStatus::Completed))
            .unwrap();
    }
    for id in ["a5", "a6"] {
        store
            .update_appointment(
                id,
                AppointmentPatch {
                    paid: Some(false),
                    ..AppointmentPatch::default()
                },
            )
            .unwrap();
    }

    let reply = Assistant::new(&store).respond("factures");
    assert!(reply.starts_with("💰 **6 paiements en attente**"));
    assert_eq!(reply.lines().filter(|l| l.starts_with('•')).count(), 5);
    assert!(reply.contains("... et 1 autres."));
}

#[test]
fn test_statistics_summary() {
    let store = demo_store((2025, 1, 13));
    let reply = Assistant::new(&store).respond("Donne-moi un résumé des statistiques");

    assert!(reply.starts_with("📊 **Résumé de votre cabinet Cabinet MediPlan:**"));
    assert!(reply.contains("• 👥 **4** patients enregistrés"));
    assert!(reply.contains("• 📅 **3** RDV aujourd'hui, **4** à venir"));
    assert!(reply.contains("Revenus du mois: **700 DH**"));
    assert!(reply.contains("Taux de présence: **100%**"));
    assert!(reply.ends_with("Excellent taux de présence ! Continuez ainsi."));
}

#[test]
fn test_high_absence_changes_analysis_and_suggestions() {
    let mut store = demo_store((2025, 1, 13));
    store
        .update_appointment("a1", AppointmentPatch::status(AppointmentStatus::Absent))
        .unwrap();
    let assistant = Assistant::new(&store);

    // 1 absent against 2 completed visits.
    let stats = assistant.respond("performance");
    assert!(stats.contains("Taux de présence: **66.7%**"));
    assert!(stats.contains("Le taux d'absence est élevé."));

    let advice = assistant.respond("des conseils ?");
    assert!(advice.contains("🔔 **Rappels automatiques:**"));
    assert!(advice.contains("📈 **Croissance:**"));
    assert!(!advice.contains("💰 **Paiements:**"));
}

#[test]
fn test_suggestions_on_empty_practice() {
    let store = blank_store();
    let reply = Assistant::new(&store).respond("optimiser");
    assert!(reply.starts_with("💡 **Suggestions pour optimiser votre cabinet:**"));
    assert!(reply.contains("📈 **Croissance:**"));
    assert!(reply.ends_with("simplifier la vie de vos patients."));
}

#[test]
fn test_fallback() {
    let store = blank_store();
    let reply = Assistant::new(&store).respond("Bonjour");
    assert!(reply.starts_with("Je n'ai pas bien compris votre demande."));
}

#[test]
fn test_conversation_round() {
    let store = demo_store((2025, 1, 13));
    let assistant = Assistant::new(&store);
    let mut conversation = Conversation::new();

    conversation.ask(&assistant, "rendez-vous aujourd'hui").unwrap();
    conversation.ask(&assistant, "merci").unwrap();

    let turns = conversation.turns();
    assert_eq!(turns.len(), 5);
    assert!(turns[2].content.contains("3 rendez-vous"));
    assert!(turns[4].content.starts_with("Je n'ai pas bien compris"));
}
