//! Derive account and resource names from endpoint URLs.

use log::debug;

use crate::field::Param;
use crate::field::ParameterSet;
use crate::resource::Service;

/// Fill the derived name fields of `params` from its endpoints.
///
/// - account: label between `://` and the first `.`, from the first endpoint
///   present; endpoints naming different accounts invalidate it.
/// - blob endpoint: container, then blob. Only the last path segment is kept
///   as the blob name; a path ending in `/` names a folder and invalidates it.
/// - file endpoint: share, then file, by the same rules.
/// - table and queue endpoints: the last path segment.
pub fn resolve(mut params: ParameterSet) -> ParameterSet {
    let endpoints = params.endpoints().clone();

    let mut account: Option<String> = None;
    let mut account_conflict = false;
    for (service, url) in endpoints.iter() {
        let Some(name) = account_name(url) else {
            debug!("cannot find account name in {service} endpoint {url}");
            continue;
        };
        let Some(existing) = account.as_deref() else {
            account = Some(name.to_string());
            continue;
        };
        if existing != name {
            debug!("{service} endpoint names account {name}, expected {existing}");
            account_conflict = true;
        }
    }
    if let Some(account) = account {
        params.set(Param::Account, account);
        if account_conflict {
            params.invalidate(Param::Account);
        }
    }

    if let Some(url) = endpoints.get(Service::Blob) {
        resolve_pair(&mut params, url, Param::Container, Param::Blob);
    }
    if let Some(url) = endpoints.get(Service::File) {
        resolve_pair(&mut params, url, Param::Share, Param::File);
    }
    if let Some(url) = endpoints.get(Service::Table) {
        resolve_single(&mut params, url, Param::Table);
    }
    if let Some(url) = endpoints.get(Service::Queue) {
        resolve_single(&mut params, url, Param::Queue);
    }

    params
}

/// Label between `://` and the first `.`.
fn account_name(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let (name, _) = rest.split_once('.')?;
    (!name.is_empty() && !name.contains('/')).then_some(name)
}

/// Path after the host, without query string or leading `/`.
fn path(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split_once('?').map_or(rest, |(rest, _)| rest);
    rest.split_once('/').map_or("", |(_, path)| path)
}

fn resolve_pair(params: &mut ParameterSet, url: &str, outer: Param, inner: Param) {
    let path = path(url);
    let Some((first, rest)) = path.split_once('/') else {
        if !path.is_empty() {
            params.set(outer, path);
        }
        return;
    };

    if !first.is_empty() {
        params.set(outer, first);
    }
    if rest.is_empty() {
        return;
    }

    if rest.ends_with('/') {
        debug!("endpoint {url} names a folder, not a {inner}");
        params.set(inner, rest);
        params.invalidate(inner);
        return;
    }

    // Subfolders are not part of the name.
    let name = rest.rsplit('/').next().unwrap_or(rest);
    params.set(inner, name);
}

fn resolve_single(params: &mut ParameterSet, url: &str, param: Param) {
    if let Some(name) = path(url).split('/').rfind(|s| !s.is_empty()) {
        params.set(param, name);
    }
}
