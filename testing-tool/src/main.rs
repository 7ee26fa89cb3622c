//! Simulador de conductor
//!
//! Inicia un viaje contra la API, genera una traza GPS ruidosa, la suaviza
//! con ventanas propias (velocidad media y rumbo circular) antes de subirla
//! por lotes, cierra el viaje y muestra las estadísticas.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use colored::*;
use rand::Rng;
use serde_json::{json, Value};

use haul_tracking::utils::geo::{GeoPoint, EARTH_RADIUS_KM};
use haul_tracking::utils::smoothing::{smoothed_heading, smoothed_speed, SmoothingWindow};

const BATCH_SIZE: usize = 10;
const WINDOW_SIZE: usize = 5;

struct Session {
    client: reqwest::Client,
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("{}", "🚛 Haul Tracking - Simulador de conductor".bright_blue().bold());
    println!("{}", "==========================================".bright_blue());
    println!();

    let base_url = prompt_with_default("URL del servidor", "http://localhost:3000")?;
    let session = Session {
        client: reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("No se pudo crear el cliente HTTP")?,
        base_url: base_url.trim_end_matches('/').to_string(),
    };

    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🚚 Simular un viaje completo");
        println!("2. 🧭 Buscar ubicaciones cercanas");
        println!("3. 🚪 Salir");
        let choice = prompt("Selecciona una opción (1-3)")?;

        let result = match choice.as_str() {
            "1" => simulate_trip(&session).await,
            "2" => find_nearby(&session).await,
            "3" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
                continue;
            }
        };

        if let Err(e) = result {
            println!("{} {}", "❌".bright_red(), e.to_string().bright_red());
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", format!("{}: ", label).bright_yellow());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_with_default(label: &str, default: &str) -> Result<String> {
    let value = prompt(&format!("{} [{}]", label, default))?;
    Ok(if value.is_empty() { default.to_string() } else { value })
}

fn prompt_f64(label: &str, default: f64) -> Result<f64> {
    let raw = prompt_with_default(label, &default.to_string())?;
    raw.parse()
        .map_err(|_| anyhow!("'{}' no es un número válido", raw))
}

/// POST/GET contra la API; devuelve `data` o el mensaje de error del sobre
async fn call(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await.context("Petición fallida")?;
    let status = response.status();
    let body: Value = response.json().await.context("Respuesta no es JSON")?;

    if !status.is_success() || body["success"] != json!(true) {
        return Err(anyhow!(
            "{} - {} ({})",
            status,
            body["message"].as_str().unwrap_or("sin mensaje"),
            body["error"]["code"].as_str().unwrap_or("?")
        ));
    }
    Ok(body["data"].clone())
}

/// Desplaza un punto `distance_km` en el rumbo dado (aproximación local)
fn advance(point: GeoPoint, heading_deg: f64, distance_km: f64) -> GeoPoint {
    let degrees_per_km = 180.0 / (std::f64::consts::PI * EARTH_RADIUS_KM);
    let heading = heading_deg.to_radians();
    let latitude = point.latitude + distance_km * heading.cos() * degrees_per_km;
    let longitude = point.longitude
        + distance_km * heading.sin() * degrees_per_km / point.latitude.to_radians().cos().max(0.01);
    GeoPoint::new(latitude, longitude)
}

async fn simulate_trip(session: &Session) -> Result<()> {
    println!();
    println!("{}", "🚚 SIMULACIÓN DE VIAJE".bright_cyan().bold());
    println!("{}", "======================".bright_cyan());

    let vehicle_id = prompt("ID del vehículo")?;
    let driver_id = prompt("ID del conductor (vacío = ninguno)")?;
    let latitude = prompt_f64("Latitud inicial", 35.71)?;
    let longitude = prompt_f64("Longitud inicial", 139.81)?;
    let steps = prompt_f64("Número de muestras", 60.0)? as usize;

    let start = GeoPoint::new(latitude, longitude);
    let mut payload = json!({
        "vehicle_id": vehicle_id,
        "start_position": { "latitude": start.latitude, "longitude": start.longitude }
    });
    if !driver_id.is_empty() {
        payload["driver_id"] = json!(driver_id);
    }

    let trip = call(
        session
            .client
            .post(format!("{}/api/trips/start", session.base_url))
            .json(&payload),
    )
    .await?;
    let trip_id = trip["id"]
        .as_str()
        .ok_or_else(|| anyhow!("La respuesta no trae id de viaje"))?
        .to_string();
    println!("{} {}", "✅ Viaje iniciado:".bright_green(), trip_id);

    let mut rng = rand::thread_rng();
    let mut speed_window = SmoothingWindow::new(WINDOW_SIZE);
    let mut heading_window = SmoothingWindow::new(WINDOW_SIZE);
    let mut position = start;
    let mut true_heading: f64 = 135.0;
    let mut pending: Vec<Value> = Vec::with_capacity(BATCH_SIZE);
    let mut uploaded = 0u64;

    for step in 0..steps {
        true_heading = (true_heading + rng.gen_range(-5.0..5.0)).rem_euclid(360.0);
        let true_speed: f64 = 40.0 + rng.gen_range(-8.0..8.0);
        // muestra cada 5 segundos
        position = advance(position, true_heading, true_speed * 5.0 / 3600.0);

        speed_window.push((true_speed + rng.gen_range(-6.0..6.0)).max(0.0));
        heading_window.push((true_heading + rng.gen_range(-20.0..20.0)).rem_euclid(360.0));

        let jitter = rng.gen_range(-0.00003..0.00003);
        pending.push(json!({
            "latitude": position.latitude + jitter,
            "longitude": position.longitude - jitter,
            "speed_kmh": smoothed_speed(&speed_window),
            "heading": smoothed_heading(&heading_window),
            "accuracy_meters": rng.gen_range(3.0..12.0),
        }));

        if pending.len() == BATCH_SIZE || step + 1 == steps {
            let result = call(
                session
                    .client
                    .post(format!("{}/api/gps/batch", session.base_url))
                    .json(&json!({ "trip_id": trip_id, "samples": pending })),
            )
            .await?;
            uploaded += result["uploaded"].as_u64().unwrap_or(0);
            println!(
                "📦 Lote: {}/{} guardadas",
                result["uploaded"],
                result["total"]
            );
            pending.clear();
        }
    }

    let result = call(
        session
            .client
            .post(format!("{}/api/trips/{}/end", session.base_url, trip_id))
            .json(&json!({
                "end_position": { "latitude": position.latitude, "longitude": position.longitude }
            })),
    )
    .await?;

    let stats = &result["statistics"];
    println!();
    println!("{}", "🏁 VIAJE COMPLETADO".bright_green().bold());
    println!("{}", "===================".bright_green());
    println!("Muestras subidas:   {}", uploaded);
    println!("Distancia (km):     {}", stats["total_distance_km"]);
    println!("Duración (s):       {}", stats["duration_seconds"]);
    println!("Velocidad media:    {}", stats["average_speed_kmh"]);
    println!("Velocidad máxima:   {}", stats["max_speed_kmh"]);
    println!("Puntos GPS:         {}", stats["gps_point_count"]);
    if stats["partial"] == json!(true) {
        println!("{}", "⚠️ Estadísticas parciales".bright_yellow());
    }
    Ok(())
}

async fn find_nearby(session: &Session) -> Result<()> {
    println!();
    println!("{}", "🧭 UBICACIONES CERCANAS".bright_cyan().bold());
    println!("{}", "=======================".bright_cyan());

    let latitude = prompt_f64("Latitud", 35.70)?;
    let longitude = prompt_f64("Longitud", 139.82)?;
    let radius = prompt_f64("Radio (m)", 5000.0)?;
    let phase = prompt_with_default("Fase (TO_LOADING, AT_UNLOADING, REFUEL, BREAK...)", "TO_LOADING")?;

    let found = call(
        session
            .client
            .get(format!("{}/api/locations/nearby", session.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("radius_meters", radius.to_string()),
                ("phase", phase),
            ]),
    )
    .await?;

    let locations = found.as_array().cloned().unwrap_or_default();
    if locations.is_empty() {
        println!("{}", "⚠️ No hay ubicaciones en el radio indicado".bright_yellow());
    }
    for location in locations {
        println!(
            "📍 {} ({}) a {:.0} m",
            location["name"].as_str().unwrap_or("?"),
            location["location_type"].as_str().unwrap_or("?"),
            location["distance_meters"].as_f64().unwrap_or(0.0)
        );
    }
    Ok(())
}
