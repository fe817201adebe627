//! §4.5 `filter_self_addresses`.

/// Returns `addrs` unchanged, unless the IPv6-only DevKnob is set, in which
/// case only addresses whose host portion parses as IPv6 are kept.
///
/// Addresses are plain host-or-host:port strings (the concrete socket-
/// address type is owned by the transport collaborator, §1); an address is
/// treated as IPv6 if its bracketed or bare host parses as
/// [`std::net::Ipv6Addr`].
pub fn filter_self_addresses(addrs: Vec<String>, ipv6_only: bool) -> Vec<String> {
    if !ipv6_only {
        return addrs;
    }
    addrs.into_iter().filter(|addr| is_ipv6_host(addr)).collect()
}

fn is_ipv6_host(addr: &str) -> bool {
    let host = addr
        .strip_prefix('[')
        .map(|rest| rest.split(']').next().unwrap_or(rest))
        .unwrap_or_else(|| addr.rsplit_once(':').map(|(h, _)| h).unwrap_or(addr));
    host.parse::<std::net::Ipv6Addr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_by_default() {
        let addrs = vec!["192.0.2.1:41641".to_string(), "[2001:db8::1]:41641".to_string()];
        assert_eq!(filter_self_addresses(addrs.clone(), false), addrs);
    }

    #[test]
    fn ipv6_only_keeps_only_ipv6() {
        let addrs = vec![
            "192.0.2.1:41641".to_string(),
            "[2001:db8::1]:41641".to_string(),
            "2001:db8::2".to_string(),
        ];
        let filtered = filter_self_addresses(addrs, true);
        assert_eq!(
            filtered,
            vec!["[2001:db8::1]:41641".to_string(), "2001:db8::2".to_string()]
        );
    }
}
