mod stats;
mod subscriptions;
mod test_email;
mod unsubscribe;
