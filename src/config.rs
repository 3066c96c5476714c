use std::{env, net::{SocketAddr, ToSocketAddrs as _}};

use sea_orm::ConnectOptions;
use tracing::{info, warn};

use crate::consts::DEFAULT_PAYROLL_CONCURRENCY;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,
    
    pub jwt_key: String,

    pub payroll: PayrollSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct PayrollSettings {
    /// Employees processed at once during a payroll run
    pub concurrency: usize,
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt().into(),
        jwt_key: load_jwt_key(),
        payroll: PayrollSettings {
            concurrency: load_payroll_concurrency(),
        },
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());
    
    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> impl Into<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");
    
    let var = env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set");
    
    var
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    let var = env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set");
    
    var
}

fn load_payroll_concurrency() -> usize {
    info!("Loading environment `PAYROLL_CONCURRENCY`");

    let Ok(var) = env::var("PAYROLL_CONCURRENCY") else {
        return DEFAULT_PAYROLL_CONCURRENCY;
    };

    parse_concurrency(&var).unwrap_or_else(|| {
        warn!(value = %var, "`PAYROLL_CONCURRENCY` is not a positive integer, using default");
        DEFAULT_PAYROLL_CONCURRENCY
    })
}

fn parse_concurrency(var: &str) -> Option<usize> {
    var.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_concurrency() {
        assert_eq!(parse_concurrency("8"), Some(8));
        assert_eq!(parse_concurrency(" 2 "), Some(2));
        assert_eq!(parse_concurrency("0"), None);
        assert_eq!(parse_concurrency("-1"), None);
        assert_eq!(parse_concurrency("many"), None);
    }
}
