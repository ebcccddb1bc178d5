use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::clients::error::{
    claim_failed, focus_failed, match_failed, open_window_failed, unsupported, ClientsResult,
};
use crate::clients::{ClientKind, ClientQuery, Clients, WindowClient};
use crate::platform::browser::{format_js_error, worker_global};

fn web_clients() -> ClientsResult<web_sys::Clients> {
    worker_global()
        .map(|global| global.clients())
        .ok_or_else(|| unsupported("not running in a service worker"))
}

fn client_type(kind: ClientKind) -> web_sys::ClientType {
    match kind {
        ClientKind::Window => web_sys::ClientType::Window,
        ClientKind::Worker => web_sys::ClientType::Worker,
        ClientKind::SharedWorker => web_sys::ClientType::Sharedworker,
        ClientKind::All => web_sys::ClientType::All,
    }
}

async fn match_web_clients(query: ClientQuery) -> ClientsResult<Vec<web_sys::Client>> {
    let options = web_sys::ClientQueryOptions::new();
    options.set_include_uncontrolled(query.include_uncontrolled);
    options.set_type(client_type(query.kind));
    let value = JsFuture::from(web_clients()?.match_all_with_options(&options))
        .await
        .map_err(|err| match_failed(format_js_error("clients.matchAll", err)))?;
    Ok(Array::from(&value)
        .iter()
        .filter_map(|client| client.dyn_into::<web_sys::Client>().ok())
        .collect())
}

/// `self.clients`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClients;

impl BrowserClients {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait(?Send)]
impl Clients for BrowserClients {
    async fn match_all(&self, query: ClientQuery) -> ClientsResult<Vec<WindowClient>> {
        let all = match_web_clients(query).await?;
        // The platform does not expose whether a client is controlled, so ask twice.
        let controlled: Vec<String> = if query.include_uncontrolled {
            match_web_clients(ClientQuery {
                include_uncontrolled: false,
                ..query
            })
            .await?
            .iter()
            .map(|client| client.id())
            .collect()
        } else {
            all.iter().map(|client| client.id()).collect()
        };

        Ok(all
            .into_iter()
            .map(|client| {
                let focused = client
                    .dyn_ref::<web_sys::WindowClient>()
                    .map(|window| window.focused())
                    .unwrap_or(false);
                let id = client.id();
                WindowClient {
                    controlled: controlled.contains(&id),
                    id,
                    url: client.url(),
                    focused,
                }
            })
            .collect())
    }

    async fn focus(&self, client: &WindowClient) -> ClientsResult<()> {
        let window = match_web_clients(ClientQuery::all_windows())
            .await?
            .into_iter()
            .find(|candidate| candidate.id() == client.id)
            .and_then(|candidate| candidate.dyn_into::<web_sys::WindowClient>().ok())
            .ok_or_else(|| focus_failed(format!("client {} is gone", client.id)))?;
        let promise = window
            .focus()
            .map_err(|err| focus_failed(format_js_error("WindowClient.focus", err)))?;
        JsFuture::from(promise)
            .await
            .map_err(|err| focus_failed(format_js_error("WindowClient.focus", err)))?;
        Ok(())
    }

    async fn open_window(&self, url: &str) -> ClientsResult<()> {
        JsFuture::from(web_clients()?.open_window(url))
            .await
            .map_err(|err| open_window_failed(format_js_error("clients.openWindow", err)))?;
        Ok(())
    }

    async fn claim(&self) -> ClientsResult<()> {
        JsFuture::from(web_clients()?.claim())
            .await
            .map_err(|err| claim_failed(format_js_error("clients.claim", err)))?;
        Ok(())
    }
}
