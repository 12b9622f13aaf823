/// Connected services and their OAuth clients

use async_trait::async_trait;
use membres_shared::models::service::{Client, CreateService, Service};

use crate::{
    fixture::{Fixture, FixtureContext, FixtureResult},
    references::reference_name,
};

struct ServiceSeed {
    name: &'static str,
    description: &'static str,
    url: &'static str,
    icon: &'static str,
    public: bool,
}

const SERVICES: &[ServiceSeed] = &[
    ServiceSeed {
        name: "Espace membres",
        description: "Créneaux, adhésion et informations personnelles",
        url: "https://membres.example.org",
        icon: "user",
        public: true,
    },
    ServiceSeed {
        name: "Wiki",
        description: "Documentation des procédures du magasin",
        url: "https://wiki.example.org",
        icon: "book",
        public: true,
    },
    ServiceSeed {
        name: "Caisse",
        description: "Logiciel de caisse",
        url: "https://caisse.example.org",
        icon: "shopping-cart",
        public: false,
    },
];

pub struct Services;

#[async_trait]
impl Fixture for Services {
    fn name(&self) -> &'static str {
        "services"
    }

    fn order(&self) -> u32 {
        4
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        for (i, seed) in SERVICES.iter().enumerate() {
            let service = Service::create(
                &ctx.pool,
                CreateService {
                    name: seed.name.to_string(),
                    description: Some(seed.description.to_string()),
                    url: Some(seed.url.to_string()),
                    icon: Some(seed.icon.to_string()),
                    public: seed.public,
                },
            )
            .await?;
            ctx.refs.add(reference_name("service", i + 1), service.id)?;
        }
        Ok(())
    }
}

/// One client per service, redirecting to the service's callback
pub struct Clients;

#[async_trait]
impl Fixture for Clients {
    fn name(&self) -> &'static str {
        "clients"
    }

    fn order(&self) -> u32 {
        6
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["services"]
    }

    async fn load(&self, ctx: &mut FixtureContext) -> FixtureResult<()> {
        for (i, seed) in SERVICES.iter().enumerate() {
            let service_id = ctx.refs.get(&reference_name("service", i + 1))?;
            let client = Client::create_for_service(
                &ctx.pool,
                service_id,
                vec![format!("{}/oauth/callback", seed.url)],
                &mut ctx.rng,
            )
            .await?;
            ctx.refs.add(reference_name("client", i + 1), client.id)?;
        }
        Ok(())
    }
}
