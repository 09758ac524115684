use crate::catalog::RouteQuery;
use crate::connectivity::ConnectivitySignal;
use crate::state::AppState;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

const OFFLINE_NOTICE: &str = "Currently displaying the last available information. This may be \
     outdated. Please check your internet connection for real-time updates.";

#[derive(Debug, Deserialize)]
struct IdRequest {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RouteParams {
    #[serde(default)]
    search: String,
    #[serde(default = "first_page")]
    page: usize,
}

fn first_page() -> usize {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectivityView {
    is_online: bool,
    notice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionView {
    expanded_line: Option<CompactString>,
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static
{
    let state_filter = warp::any().map(move || state.clone()).boxed();

    // GET /alerts
    let alerts_route = warp::path!("alerts")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<AppState>| warp::reply::json(&state.alert_panel()));

    // GET /connectivity
    let connectivity_route = warp::path!("connectivity")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<AppState>| {
            let is_online = state.is_online();
            warp::reply::json(&ConnectivityView {
                is_online,
                notice: (!is_online).then_some(OFFLINE_NOTICE),
            })
        });

    // POST /connectivity/{online|offline}
    let signal_route = warp::path!("connectivity" / String)
        .and(warp::post())
        .and(state_filter.clone())
        .map(|kind: String, state: Arc<AppState>| {
            let signal = match kind.as_str() {
                "online" => ConnectivitySignal::Online,
                "offline" => ConnectivitySignal::Offline,
                _ => return StatusCode::NOT_FOUND,
            };
            state.signals.emit(signal);
            StatusCode::ACCEPTED
        });

    // GET /preferences
    let preferences_route = warp::path!("preferences")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<AppState>| warp::reply::json(&state.preferences.snapshot()));

    // POST /preferences/toggle
    let toggle_route = warp::path!("preferences" / "toggle")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .map(|req: IdRequest, state: Arc<AppState>| {
            state.preferences.toggle(&req.id);
            warp::reply::json(&state.preferences.snapshot())
        });

    // GET /lines
    let lines_route = warp::path!("lines")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<AppState>| warp::reply::json(&state.preferences.lines()));

    // POST /lines/select
    let select_route = warp::path!("lines" / "select")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .map(|req: IdRequest, state: Arc<AppState>| {
            let expanded_line = state.preferences.set_line_selection(&req.id);
            warp::reply::json(&SelectionView { expanded_line })
        });

    // GET /routes?search=&page=
    let bus_routes_route = warp::path!("routes")
        .and(warp::get())
        .and(warp::query::<RouteParams>())
        .and(state_filter)
        .map(|params: RouteParams, state: Arc<AppState>| {
            let query = RouteQuery {
                search: params.search,
                page: params.page,
            };
            warp::reply::json(&state.preferences.route_page(&query))
        });

    alerts_route
        .or(connectivity_route)
        .or(signal_route)
        .or(preferences_route)
        .or(toggle_route)
        .or(lines_route)
        .or(select_route)
        .or(bus_routes_route)
}
