use std::{
    collections::HashMap,
    net::SocketAddr,
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, trace, warn};

use climate_common::{
    parse_zone_topic, reading_topic, settings_filter, ControlOutcome, Controller,
    ControllerConfig, Setting, ZoneTopic, READING_HUMIDITY, READING_TEMPERATURE,
};

use crate::devices::{LoggingActuator, MonotonicClock};

type ZoneController = Controller<MonotonicClock, LoggingActuator>;

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;
const DEFAULT_ZONE: &str = "zone1";
const DEFAULT_CONTROL_INTERVAL_SECS: u64 = 5;
const DEFAULT_READING_STALE_SECS: u64 = 300;

#[derive(Clone)]
struct AppState {
    controller: Arc<Mutex<ZoneController>>,
    readings: Arc<Mutex<Readings>>,
    zone: Arc<str>,
    stale_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    value: f32,
    received_at: Instant,
}

impl Sample {
    fn now(value: f32) -> Self {
        Self {
            value,
            received_at: Instant::now(),
        }
    }
}

/// Latest sample per quantity, as published by the external sampler.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Readings {
    temperature: Option<Sample>,
    humidity: Option<Sample>,
}

impl Readings {
    /// Both values, provided each arrived within `max_age` of `now`.
    fn fresh(&self, now: Instant, max_age: Duration) -> Option<(f32, f32)> {
        let fresh = |sample: Option<Sample>| {
            sample
                .filter(|sample| now.saturating_duration_since(sample.received_at) <= max_age)
                .map(|sample| sample.value)
        };
        Some((fresh(self.temperature)?, fresh(self.humidity)?))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let zone: Arc<str> = std::env::var("CLIMATE_ZONE")
        .unwrap_or_else(|_| DEFAULT_ZONE.to_string())
        .into();
    let config = overlay_settings(ControllerConfig::default(), |name| std::env::var(name).ok());
    info!(
        zone = %zone,
        mode = config.mode.as_str(),
        heat_pump = config.uses_heat_pump,
        "starting climate controller"
    );

    let clock = MonotonicClock::new(env_parse("CLOCK_WRAP_MS"));
    let controller = Controller::new(config, clock, LoggingActuator::new(&*zone));

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let mqtt_port = env_parse::<u16>("MQTT_PORT").unwrap_or(1883);

    let client_id = format!("climate-controller-{zone}");
    let mut mqtt_options = MqttOptions::new(client_id, mqtt_host, mqtt_port);
    mqtt_options.set_keep_alive(Duration::from_secs(60));
    if let Ok(user) = std::env::var("MQTT_USER") {
        let pass = std::env::var("MQTT_PASS").unwrap_or_default();
        mqtt_options.set_credentials(user, pass);
    }

    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 32);

    let app_state = AppState {
        controller: Arc::new(Mutex::new(controller)),
        readings: Arc::new(Mutex::new(Readings::default())),
        zone,
        stale_after: Duration::from_secs(
            env_parse("READING_STALE_SECS").unwrap_or(DEFAULT_READING_STALE_SECS),
        ),
    };

    let period = env_parse::<u64>("CONTROL_INTERVAL_SECS")
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_CONTROL_INTERVAL_SECS);

    spawn_mqtt_loop(app_state.clone(), mqtt, eventloop);
    let control_task = spawn_control_loop(app_state.clone(), Duration::from_secs(period));

    let app = Router::new()
        .route("/api/config", get(handle_get_config).put(handle_put_config))
        .route("/api/settings/{key}", post(handle_post_setting))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());

    let port: u16 = env_parse("CONTROLLER_HTTP_PORT").unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind controller server at {addr}"))?;

    info!("controller listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state, control_task))
        .await
        .context("controller server failed")?;
    Ok(())
}

fn subscribe_topics(mqtt: &AsyncClient, zone: &str) {
    let topics = [
        reading_topic(zone, READING_TEMPERATURE),
        reading_topic(zone, READING_HUMIDITY),
        settings_filter(zone),
    ];

    for topic in topics {
        if let Err(err) = mqtt.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
            warn!("failed to subscribe to {topic}: {err}");
        }
    }
}

fn spawn_mqtt_loop(app_state: AppState, mqtt: AsyncClient, mut eventloop: rumqttc::EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if let Err(err) =
                        handle_mqtt_message(&app_state, &message.topic, &message.payload).await
                    {
                        warn!("mqtt message handling error: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    // Clean sessions drop subscriptions, so renew them on every connect.
                    info!("mqtt connected");
                    subscribe_topics(&mqtt, &app_state.zone);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

fn spawn_control_loop(app_state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            evaluate(&app_state).await;
        }
    })
}

async fn evaluate(app_state: &AppState) {
    let readings = *app_state.readings.lock().await;
    let Some((temperature, humidity)) = readings.fresh(Instant::now(), app_state.stale_after)
    else {
        // Hold the current output until the sampler reports again.
        if readings.temperature.is_some() && readings.humidity.is_some() {
            warn!(?readings, "readings are stale, skipping evaluation");
        } else {
            debug!(?readings, "waiting for readings");
        }
        return;
    };

    let (outcome, mode) = {
        let mut controller = app_state.controller.lock().await;
        let outcome = controller.control(temperature, humidity);
        (outcome, controller.config().mode)
    };

    match outcome {
        ControlOutcome::Held(channel) => debug!(
            mode = mode.as_str(),
            output = channel.as_str(),
            "short-cycle guard holding output"
        ),
        ControlOutcome::Unchanged(channel) => trace!(
            mode = mode.as_str(),
            output = channel.as_str(),
            temperature,
            humidity,
            "output unchanged"
        ),
        ControlOutcome::Switched { from, to } => info!(
            mode = mode.as_str(),
            from = from.as_str(),
            to = to.as_str(),
            temperature,
            humidity,
            "control decision"
        ),
    }
}

async fn handle_mqtt_message(
    app_state: &AppState,
    topic: &str,
    payload: &[u8],
) -> anyhow::Result<()> {
    if payload.len() > MAX_MQTT_PAYLOAD_BYTES {
        warn!(
            "dropping oversized MQTT payload on topic {} ({} bytes)",
            topic,
            payload.len()
        );
        return Ok(());
    }

    let message = std::str::from_utf8(payload).context("non utf8 mqtt payload")?;

    match parse_zone_topic(&app_state.zone, topic) {
        Some(ZoneTopic::Temperature) => match parse_temperature(message) {
            Some(temperature) => {
                app_state.readings.lock().await.temperature = Some(Sample::now(temperature));
            }
            None => warn!("discarding temperature reading {message:?}"),
        },
        Some(ZoneTopic::Humidity) => match parse_humidity(message) {
            Some(humidity) => {
                app_state.readings.lock().await.humidity = Some(Sample::now(humidity));
            }
            None => warn!("discarding humidity reading {message:?}"),
        },
        Some(ZoneTopic::Setting(key)) => {
            let setting = Setting::parse(key, message)
                .with_context(|| format!("rejected setting on {topic}"))?;
            apply_setting(app_state, setting).await;
        }
        None => debug!("ignoring message on {topic}"),
    }

    Ok(())
}

async fn apply_setting(app_state: &AppState, setting: Setting) -> bool {
    let changed = app_state.controller.lock().await.apply_setting(setting);
    if changed {
        info!(key = setting.key(), ?setting, "setting updated");
    }
    changed
}

async fn handle_get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.controller.lock().await.config().clone();
    Json(config)
}

async fn handle_put_config(
    State(state): State<AppState>,
    Json(config): Json<ControllerConfig>,
) -> impl IntoResponse {
    info!(mode = config.mode.as_str(), "configuration replaced");
    state.controller.lock().await.set_config(config);
    handle_get_config(State(state)).await
}

async fn handle_post_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };

    match Setting::parse(&key, value) {
        Ok(setting) => {
            apply_setting(&state, setting).await;
            handle_get_config(State(state)).await.into_response()
        }
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

async fn shutdown_signal(state: AppState, control_task: JoinHandle<()>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }

    stop_control(&state, control_task).await;
}

/// Stops periodic evaluation, then turns every output off through the controller.
async fn stop_control(state: &AppState, control_task: JoinHandle<()>) {
    control_task.abort();
    // Resolves once the task is gone, so no tick can follow the shutdown below.
    let _ = control_task.await;

    info!(zone = %state.zone, "shutting down, de-energizing outputs");
    let outcome = state.controller.lock().await.shutdown();
    debug!(?outcome, "outputs de-energized");
}

/// Applies `CLIMATE_<KEY>` overrides on top of `config`; bad values are skipped.
fn overlay_settings(
    mut config: ControllerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ControllerConfig {
    for key in Setting::KEYS {
        let name = format!("CLIMATE_{}", key.to_ascii_uppercase());
        let Some(value) = lookup(&name) else {
            continue;
        };
        match Setting::parse(key, &value) {
            Ok(setting) => {
                setting.apply_to(&mut config);
            }
            Err(err) => warn!("ignoring {name}: {err}"),
        }
    }
    config
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_temperature(message: &str) -> Option<f32> {
    parse_bounded(message, -40.0..=150.0)
}

fn parse_humidity(message: &str) -> Option<f32> {
    parse_bounded(message, 0.0..=100.0)
}

fn parse_bounded(message: &str, range: std::ops::RangeInclusive<f32>) -> Option<f32> {
    message
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite() && range.contains(value))
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
