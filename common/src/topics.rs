pub const TOPIC_ROOT: &str = "climate";

pub const READING_TEMPERATURE: &str = "temperature";
pub const READING_HUMIDITY: &str = "humidity";

/// `climate/<zone>/readings/<name>`
pub fn reading_topic(zone: &str, name: &str) -> String {
    format!("{TOPIC_ROOT}/{zone}/readings/{name}")
}

/// Wildcard subscription for every setting of a zone.
pub fn settings_filter(zone: &str) -> String {
    format!("{TOPIC_ROOT}/{zone}/settings/+")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTopic<'a> {
    Temperature,
    Humidity,
    Setting(&'a str),
}

/// Classifies an incoming topic for `zone`; anything else is `None`.
pub fn parse_zone_topic<'a>(zone: &str, topic: &'a str) -> Option<ZoneTopic<'a>> {
    let rest = topic
        .strip_prefix(TOPIC_ROOT)?
        .strip_prefix('/')?
        .strip_prefix(zone)?
        .strip_prefix('/')?;

    if let Some(key) = rest.strip_prefix("settings/") {
        return (!key.is_empty() && !key.contains('/')).then_some(ZoneTopic::Setting(key));
    }

    match rest.strip_prefix("readings/")? {
        READING_TEMPERATURE => Some(ZoneTopic::Temperature),
        READING_HUMIDITY => Some(ZoneTopic::Humidity),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_zone_topics() {
        assert_eq!(
            reading_topic("den", READING_TEMPERATURE),
            "climate/den/readings/temperature"
        );
        assert_eq!(settings_filter("den"), "climate/den/settings/+");
    }

    #[test]
    fn classifies_incoming_topics() {
        assert_eq!(
            parse_zone_topic("den", "climate/den/readings/temperature"),
            Some(ZoneTopic::Temperature)
        );
        assert_eq!(
            parse_zone_topic("den", "climate/den/readings/humidity"),
            Some(ZoneTopic::Humidity)
        );
        assert_eq!(
            parse_zone_topic("den", "climate/den/settings/mode"),
            Some(ZoneTopic::Setting("mode"))
        );
    }

    #[test]
    fn ignores_foreign_and_malformed_topics() {
        assert_eq!(parse_zone_topic("den", "climate/attic/settings/mode"), None);
        assert_eq!(parse_zone_topic("den", "climate/denx/readings/humidity"), None);
        assert_eq!(parse_zone_topic("den", "climate/den/readings/pressure"), None);
        assert_eq!(parse_zone_topic("den", "climate/den/settings/"), None);
        assert_eq!(parse_zone_topic("den", "climate/den/settings/a/b"), None);
        assert_eq!(parse_zone_topic("den", "other/den/settings/mode"), None);
    }
}
