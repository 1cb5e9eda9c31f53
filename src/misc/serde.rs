use std::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer,
    de::{self, Visitor},
};
use serde_json::Value;

/// Deserializer that initialises a `null` value (such as a YAML section given without
/// any fields) to `Some(T::default())` instead of `None`.
///
/// # Example
///
/// ```yaml
/// # storyrover.yaml
/// hardware:
/// ```
/// This evaluates to `{ "hardware": null }`, which this deserializer turns into
/// `Some(HardwareConfig::default())`. `false` yields `None` and `true` the defaults.
pub fn deserialise_empty_to_default<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    struct OptionalStructVisitor<T>(PhantomData<T>);

    impl<'de, T> Visitor<'de> for OptionalStructVisitor<T>
    where
        T: Deserialize<'de> + Default,
    {
        type Value = Option<T>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("null, boolean, map, or empty map")
        }

        fn visit_bool<E>(self, enabled: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(enabled.then(T::default))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(T::default()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(T::default()))
        }

        fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
        where
            M: de::MapAccess<'de>,
        {
            T::deserialize(de::value::MapAccessDeserializer::new(map)).map(Some)
        }
    }

    deserializer.deserialize_any(OptionalStructVisitor(PhantomData))
}

/// Reads any JSON scalar as a string. Non-string values are rendered as JSON, `null`
/// counts as absent.
pub fn deserialise_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value),
        Some(other) => Some(other.to_string()),
    })
}
