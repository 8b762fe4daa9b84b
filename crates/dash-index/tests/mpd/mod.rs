mod errors;
mod live;
mod on_demand;
mod protection;
mod template;
