//! Seed the `barbers` table with sample listings.
//!
//! Useful for local development of the listing endpoints. Accounts are never
//! seeded; create them through `POST /register`.

use tracing::info;

use super::{CommandError, connect};

/// A sample barber row.
struct SeedBarber {
    name: &'static str,
    basic_info: &'static str,
    price: i32,
    experience: &'static str,
    status: &'static str,
    image_path: &'static str,
}

const SAMPLE_BARBERS: &[SeedBarber] = &[
    SeedBarber {
        name: "Alex Moreno",
        basic_info: "Skin fades and beard sculpting",
        price: 35,
        experience: "senior",
        status: "available",
        image_path: "/images/barbers/alex.jpg",
    },
    SeedBarber {
        name: "Bea Lindqvist",
        basic_info: "Scissor cuts for longer hair",
        price: 30,
        experience: "middle",
        status: "available",
        image_path: "/images/barbers/bea.jpg",
    },
    SeedBarber {
        name: "Chidi Okafor",
        basic_info: "Classic cuts and hot towel shaves",
        price: 40,
        experience: "senior",
        status: "busy",
        image_path: "/images/barbers/chidi.jpg",
    },
    SeedBarber {
        name: "Dana Kim",
        basic_info: "Buzz cuts and line-ups",
        price: 20,
        experience: "junior",
        status: "available",
        image_path: "/images/barbers/dana.jpg",
    },
    SeedBarber {
        name: "Eli Novak",
        basic_info: "Textured crops",
        price: 25,
        experience: "junior",
        status: "on_leave",
        image_path: "/images/barbers/eli.jpg",
    },
    SeedBarber {
        name: "Farah Haddad",
        basic_info: "Kids' cuts and family appointments",
        price: 22,
        experience: "middle",
        status: "available",
        image_path: "/images/barbers/farah.jpg",
    },
    SeedBarber {
        name: "Gus Petrov",
        basic_info: "Pompadours and slick-backs",
        price: 38,
        experience: "senior",
        status: "available",
        image_path: "/images/barbers/gus.jpg",
    },
];

/// Insert the sample barbers.
///
/// # Arguments
///
/// * `clear_existing` - If true, delete all barbers first
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or a query fails.
pub async fn barbers(clear_existing: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    if clear_existing {
        let deleted = sqlx::query("DELETE FROM barbers")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        info!(deleted, "Cleared existing barbers");
    }

    for barber in SAMPLE_BARBERS {
        sqlx::query(
            r"
            INSERT INTO barbers (name, basic_info, price, experience, status, image_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(barber.name)
        .bind(barber.basic_info)
        .bind(barber.price)
        .bind(barber.experience)
        .bind(barber.status)
        .bind(barber.image_path)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(inserted = SAMPLE_BARBERS.len(), "Seeding complete!");
    Ok(())
}
