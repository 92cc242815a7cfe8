use conman_storage::Profile;

/// Arguments for the external SSH client:
/// `["<user>@<host>", "-p", "<port>", ...ssh_options]`, never reordered.
pub fn ssh_args(profile: &Profile) -> Vec<String> {
    let mut args = Vec::with_capacity(3 + profile.ssh_options.len());
    args.push(format!("{}@{}", profile.username, profile.host));
    args.push("-p".to_string());
    args.push(profile.port.to_string());
    args.extend(profile.ssh_options.iter().cloned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use conman_storage::Protocol;

    #[test]
    fn argument_vector_is_exact() {
        let profile = Profile::new("p", "h", Protocol::Ssh)
            .with_username("u")
            .with_port(2222)
            .with_ssh_options(["-v"]);
        assert_eq!(ssh_args(&profile), vec!["u@h", "-p", "2222", "-v"]);
    }

    #[test]
    fn options_keep_their_order() {
        let profile = Profile::new("p", "example.org", Protocol::Ssh)
            .with_username("root")
            .with_ssh_options(["-L", "8080:localhost:80", "-v"]);
        assert_eq!(
            ssh_args(&profile),
            vec!["root@example.org", "-p", "22", "-L", "8080:localhost:80", "-v"]
        );
    }
}
