mod load;
mod record;
mod register;
