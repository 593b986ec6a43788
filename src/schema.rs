diesel::table! {
    accounts (id) {
        id -> Text,
        base_currency -> Text,
        cash_balance -> Text,
        principal -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    positions (id) {
        id -> Text,
        account_id -> Text,
        symbol -> Text,
        display_name -> Text,
        last_price -> Text,
        last_change -> Text,
        last_change_pct -> Text,
        lots -> Text,
    }
}

diesel::table! {
    realized_trades (id) {
        id -> Text,
        account_id -> Text,
        trade_date -> Text,
        symbol -> Text,
        display_name -> Text,
        quantity -> Text,
        cost_basis -> Text,
        proceeds -> Text,
        profit -> Text,
        roi_pct -> Text,
    }
}

diesel::table! {
    asset_snapshots (id) {
        id -> Text,
        account_id -> Text,
        snapshot_date -> Text,
        net_asset_value -> Text,
        principal -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(accounts, positions, realized_trades, asset_snapshots,);
