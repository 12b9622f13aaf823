/// The sample data set, in load order
///
/// | Order | Fixture | Reads |
/// |---|---|---|
/// | 1 | users | |
/// | 2 | admins | |
/// | 3 | super_admin | |
/// | 4 | services | |
/// | 5 | jobs | |
/// | 6 | clients | services |
/// | 7 | events | |
/// | 8 | formations | |
/// | 9 | beneficiaries | users, formations |
/// | 10 | periods | jobs |
/// | 11 | period_positions | periods, formations, beneficiaries, admins |
/// | 12 | registrations | beneficiaries, admins |
/// | 13 | shifts | users, beneficiaries |
/// | 14 | codes | users, admins |
/// | 15 | commissions | beneficiaries, super_admin |

use std::sync::Arc;

use crate::fixture::Fixture;

pub mod accounts;
pub mod catalog;
pub mod codes;
pub mod commissions;
pub mod data;
pub mod members;
pub mod schedule;
pub mod services;

/// Every fixture, in no particular order
pub fn all() -> Vec<Arc<dyn Fixture>> {
    vec![
        Arc::new(accounts::Users),
        Arc::new(accounts::Admins),
        Arc::new(accounts::SuperAdmin),
        Arc::new(services::Services),
        Arc::new(catalog::Jobs),
        Arc::new(services::Clients),
        Arc::new(catalog::Events),
        Arc::new(catalog::Formations),
        Arc::new(members::Beneficiaries),
        Arc::new(schedule::Periods),
        Arc::new(schedule::PeriodPositions),
        Arc::new(members::Registrations),
        Arc::new(schedule::Shifts),
        Arc::new(codes::Codes),
        Arc::new(commissions::Commissions),
    ]
}
