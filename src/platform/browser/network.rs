use bytes::Bytes;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::fetch::error::{body_read_failed, internal_error, invalid_request, unreachable, NetworkResult};
use crate::fetch::{Network, Request, Response};
use crate::platform::browser::{format_js_error, worker_global};

/// Transport backed by the worker's global `fetch`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNetwork;

impl BrowserNetwork {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait(?Send)]
impl Network for BrowserNetwork {
    async fn fetch(&self, request: &Request) -> NetworkResult<Response> {
        let global = worker_global().ok_or_else(|| internal_error("not running in a service worker"))?;
        let js_request = to_web_request(request)
            .map_err(|err| invalid_request(format_js_error("new Request", err)))?;
        let value = JsFuture::from(global.fetch_with_request(&js_request))
            .await
            .map_err(|err| unreachable(format_js_error("fetch", err)))?;
        let response: web_sys::Response = value
            .dyn_into()
            .map_err(|_| internal_error("fetch resolved to a non-Response value"))?;
        from_web_response(&response)
            .await
            .map_err(|err| body_read_failed(format_js_error("Response.arrayBuffer", err)))
    }
}

pub(crate) fn to_web_request(request: &Request) -> Result<web_sys::Request, JsValue> {
    let init = web_sys::RequestInit::new();
    init.set_method(request.method.as_str());
    if !request.headers.is_empty() {
        let headers = web_sys::Headers::new()?;
        for (name, value) in &request.headers {
            headers.append(name, value)?;
        }
        init.set_headers(&headers);
    }
    web_sys::Request::new_with_str_and_init(&request.url, &init)
}

pub(crate) fn from_web_request(request: &web_sys::Request) -> Request {
    let method = request.method().parse().unwrap_or(crate::fetch::Method::Get);
    let mut converted = Request::new(method, request.url());
    for (name, value) in header_pairs(&request.headers()) {
        converted = converted.with_header(name, value);
    }
    converted
}

pub(crate) fn to_web_response(response: &Response) -> Result<web_sys::Response, JsValue> {
    let init = web_sys::ResponseInit::new();
    init.set_status(response.status);
    init.set_status_text(&response.status_text);
    let headers = web_sys::Headers::new()?;
    for (name, value) in &response.headers {
        headers.append(name, value)?;
    }
    init.set_headers(&headers);
    let body = Uint8Array::from(response.body.as_ref());
    web_sys::Response::new_with_opt_buffer_source_and_init(Some(&body), &init)
}

pub(crate) async fn from_web_response(response: &web_sys::Response) -> Result<Response, JsValue> {
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    let body = Bytes::from(Uint8Array::new(&buffer).to_vec());
    let mut converted = Response::new(response.status(), body)
        .with_status_text(response.status_text())
        .with_url(response.url());
    for (name, value) in header_pairs(&response.headers()) {
        converted = converted.with_header(name, value);
    }
    Ok(converted)
}

fn header_pairs(headers: &web_sys::Headers) -> Vec<(String, String)> {
    let Ok(Some(entries)) = js_sys::try_iter(headers) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pair = Array::from(&entry);
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}
