use crate::constants::AWS_QUERY_ENCODE_SET;
use percent_encoding::utf8_percent_encode;

/// Encode ordered `(key, value)` pairs into a canonical query string.
///
/// Pairs are emitted in input order as `key=value` joined by `&`. Only values
/// are percent encoded, keys are expected to be fixed SigV4 parameter names.
/// Empty input yields an empty string.
pub fn encode_query(pairs: &[(&str, &str)]) -> String {
    let mut query = String::with_capacity(256);
    for (idx, (k, v)) in pairs.iter().enumerate() {
        if idx != 0 {
            query.push('&');
        }
        query.push_str(k);
        query.push('=');
        query.extend(utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET));
    }
    query
}

/// Percent encode a single query value.
pub fn encode_query_value(v: &str) -> String {
    utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_encode_query_empty() {
        assert_eq!(encode_query(&[]), "");
    }

    #[test]
    fn test_encode_query_keeps_order() {
        let query = encode_query(&[("b", "2"), ("a", "1"), ("c", "3")]);
        assert_eq!(query, "b=2&a=1&c=3");
    }

    #[test_case("AKIDEXAMPLE/20240101/us-east-1/iotdevicegateway/aws4_request", "AKIDEXAMPLE%2F20240101%2Fus-east-1%2Fiotdevicegateway%2Faws4_request"; "slashes")]
    #[test_case("a b", "a%20b"; "space is not plus")]
    #[test_case("a+b=c&d", "a%2Bb%3Dc%26d"; "reserved")]
    #[test_case("-._~", "-._~"; "unreserved")]
    #[test_case("ü", "%C3%BC"; "utf8")]
    fn test_encode_query_value(input: &str, expected: &str) {
        assert_eq!(encode_query_value(input), expected);
        assert_eq!(encode_query(&[("k", input)]), format!("k={expected}"));
    }

    #[test]
    fn test_encode_query_round_trip() {
        let pairs = [
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256"),
            ("X-Amz-Credential", "AKID/20240101/eu-west-1/iotdevicegateway/aws4_request"),
            ("token", "IQoJb3JpZ2luX2VjE+/= with spaces%"),
        ];
        let query = encode_query(&pairs);

        for ((k, v), part) in pairs.iter().zip(query.split('&')) {
            let (key, encoded) = part.split_once('=').expect("pair must contain '='");
            let decoded = percent_decode_str(encoded)
                .decode_utf8()
                .expect("value must be utf-8");

            assert_eq!(key, *k);
            assert_eq!(decoded, *v);
            assert_eq!(encode_query_value(&decoded), encoded);
        }
    }
}
