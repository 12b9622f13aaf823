/// Jobs, formations and events: reference data without owners

use async_trait::async_trait;
use chrono::Duration;
use membres_shared::models::{
    event::{CreateEvent, Event},
    formation::{CreateFormation, Formation},
    job::{CreateJob, Job},
};

use crate::{
    fixture::{Fixture, FixtureContext, FixtureResult},
    references::reference_name,
};

/// (name, color, description)
const JOBS: &[(&str, &str, &str)] = &[
    ("Épicerie", "#2ecc71", "Mise en rayon et facing"),
    ("Caisse", "#e74c3c", "Encaissement des achats"),
    ("Réception", "#3498db", "Réception et contrôle des livraisons"),
    ("Accueil", "#f1c40f", "Accueil des membres et des curieux"),
];

/// Formation 1 gates the cash desk positions
const FORMATIONS: &[(&str, &str)] = &[
    ("Caisse", "Utilisation du logiciel de caisse"),
    ("Référent·e de créneau", "Ouverture, fermeture et coordination du créneau"),
    ("Hygiène", "Chaîne du froid et nettoyage"),
];

pub const FORMATION_COUNT: usize = FORMATIONS.len();

pub struct Jobs;

#[async_trait]
impl Fixture for Jobs {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn order(&self) -> u32 {
        5
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        for (i, (name, color, description)) in JOBS.iter().enumerate() {
            let job = Job::create(
                &ctx.pool,
                CreateJob {
                    name: name.to_string(),
                    color: color.to_string(),
                    description: Some(description.to_string()),
                    min_shifter_alert: 2,
                },
            )
            .await?;
            ctx.refs.add(reference_name("job", i + 1), job.id)?;
        }
        Ok(())
    }
}

/// A general assembly with proxies and a past information meeting
pub struct Events;

#[async_trait]
impl Fixture for Events {
    fn name(&self) -> &'static str {
        "events"
    }

    fn order(&self) -> u32 {
        7
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        let assembly_date = ctx.now + Duration::days(30);
        let assembly = Event::create(
            &ctx.pool,
            CreateEvent {
                title: "Assemblée générale".to_string(),
                description: Some("Bilan de l'année et élection du conseil".to_string()),
                date: assembly_date,
                max_date_of_last_registration: Some(assembly_date - Duration::days(2)),
                need_proxy: true,
            },
        )
        .await?;
        ctx.refs.add("event-assembly", assembly.id)?;

        let meeting = Event::create(
            &ctx.pool,
            CreateEvent {
                title: "Réunion d'information".to_string(),
                description: Some("Présentation du magasin aux nouveaux membres".to_string()),
                date: ctx.now - Duration::days(14),
                max_date_of_last_registration: None,
                need_proxy: false,
            },
        )
        .await?;
        ctx.refs.add("event-meeting", meeting.id)
    }
}

pub struct Formations;

#[async_trait]
impl Fixture for Formations {
    fn name(&self) -> &'static str {
        "formations"
    }

    fn order(&self) -> u32 {
        8
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        for (i, (name, description)) in FORMATIONS.iter().enumerate() {
            let formation = Formation::create(
                &ctx.pool,
                CreateFormation {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                },
            )
            .await?;
            ctx.refs.add(reference_name("formation", i + 1), formation.id)?;
        }
        Ok(())
    }
}
