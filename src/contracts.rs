/// Contract bindings using the Alloy sol! macro
/// Only the view functions needed for pricing are declared

use alloy::sol;

sol! {
    /// ERC20 metadata
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
    }
}

sol! {
    /// UniswapV2 pair: token order plus packed reserves
    #[sol(rpc)]
    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (
            uint112 reserve0,
            uint112 reserve1,
            uint32 blockTimestampLast
        );
    }
}

sol! {
    /// UniswapV3 pool: token order plus slot0
    #[sol(rpc)]
    interface IUniswapV3Pool {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
    }
}
